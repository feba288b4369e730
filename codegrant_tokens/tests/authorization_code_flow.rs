use codegrant_clock::{TestClock, UnixTime};
use codegrant_tokens::{
    AuthorizationCode, ClientId, ClientSecret, TokenClient, TokenClientError, TokenStatus,
};
use reqwest::Url;
use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const REDIRECT_URI: &str = "https://app.example/cb";

fn client_for(server: &MockServer, clock: &TestClock) -> TokenClient<reqwest::Client, TestClock> {
    TokenClient::new(
        ClientId::from_static("my-client"),
        ClientSecret::from_static("my-secret"),
        Url::parse("https://idp.example/authorize").unwrap(),
        Url::parse(&format!("{}/token", server.uri())).unwrap(),
    )
    .with_clock(clock.clone())
}

#[tokio::test]
async fn authorize_exchange_and_refresh() {
    let server = MockServer::start().await;
    let clock = TestClock::new(UnixTime(1_700_000_000));
    let client = client_for(&server, &clock);

    let auth = client.authorization_url(REDIRECT_URI, "openid profile");
    assert!(auth
        .as_str()
        .starts_with("https://idp.example/authorize?response_type=code&client_id=my-client&"));

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=CODE"))
        .and(body_string_contains("client_secret=my-secret"))
        .and(body_string_contains("redirect_uri=https%3A%2F%2Fapp.example%2Fcb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "refresh_token": "RT1",
            "expires_in": 60,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let accepted = client
        .exchange_code(&AuthorizationCode::from_static("CODE"), REDIRECT_URI)
        .await
        .unwrap();
    assert!(accepted);
    assert_eq!(client.valid_access_token().await.unwrap().as_str(), "AT1");

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=RT1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT2",
            "refresh_token": "RT2",
            "expires_in": 60,
        })))
        .expect(1)
        .mount(&server)
        .await;

    clock.inc(61);
    assert_eq!(client.status().await, TokenStatus::Expired);
    assert_eq!(client.valid_access_token().await.unwrap().as_str(), "AT2");

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token=RT2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT3",
            "expires_in": 60,
        })))
        .expect(1)
        .mount(&server)
        .await;

    clock.inc(61);
    assert_eq!(client.valid_access_token().await.unwrap().as_str(), "AT3");

    let state = client.token_state().await.unwrap();
    assert_eq!(state.refresh_token().map(|r| r.as_str()), Some("RT2"));
}

#[tokio::test]
async fn rejected_code_is_not_an_error() {
    let server = MockServer::start().await;
    let clock = TestClock::new(UnixTime(1_700_000_000));
    let client = client_for(&server, &clock);

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"error": "invalid_grant"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let accepted = client
        .exchange_code(&AuthorizationCode::from_static("EXPIRED"), REDIRECT_URI)
        .await
        .unwrap();

    assert!(!accepted);
    assert!(matches!(
        client.valid_access_token().await,
        Err(TokenClientError::Unauthenticated)
    ));
}

#[tokio::test]
async fn outage_during_refresh_keeps_tokens_for_retry() {
    let server = MockServer::start().await;
    let clock = TestClock::new(UnixTime(1_700_000_000));
    let client = client_for(&server, &clock);

    Mock::given(method("POST"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "refresh_token": "RT1",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;

    assert!(client
        .exchange_code(&AuthorizationCode::from_static("CODE"), REDIRECT_URI)
        .await
        .unwrap());

    clock.inc(3599);
    assert_eq!(client.valid_access_token().await.unwrap().as_str(), "AT1");

    Mock::given(method("POST"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    clock.inc(2);
    let err = client.valid_access_token().await.unwrap_err();
    assert!(matches!(err, TokenClientError::RefreshFailed { .. }));

    let state = client.token_state().await.unwrap();
    assert_eq!(state.access_token().as_str(), "AT1");
    assert_eq!(state.refresh_token().map(|r| r.as_str()), Some("RT1"));

    Mock::given(method("POST"))
        .and(body_string_contains("refresh_token=RT1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT2",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;

    assert_eq!(client.valid_access_token().await.unwrap().as_str(), "AT2");
}

#[tokio::test]
async fn state_survives_a_round_trip_through_storage() {
    let server = MockServer::start().await;
    let clock = TestClock::new(UnixTime(1_700_000_000));
    let client = client_for(&server, &clock);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "refresh_token": "RT1",
            "id_token": "ID1",
            "token_type": "Bearer",
            "expires_in": 300,
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client
        .exchange_code(&AuthorizationCode::from_static("CODE"), REDIRECT_URI)
        .await
        .unwrap());

    let saved = serde_json::to_string(&client.token_state().await.unwrap()).unwrap();

    let restarted = client_for(&server, &clock);
    restarted
        .restore_token_state(serde_json::from_str(&saved).unwrap())
        .await;

    assert_eq!(restarted.valid_access_token().await.unwrap().as_str(), "AT1");
    let state = restarted.token_state().await.unwrap();
    assert_eq!(state.id_token().map(|i| i.as_str()), Some("ID1"));
}
