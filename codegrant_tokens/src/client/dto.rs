//! DTOs for interacting with the authority's token endpoint

use serde::Deserialize;

use crate::{
    AccessToken, AuthorizationCodeRef, ClientIdRef, ClientSecretRef, IdToken, RefreshToken,
    RefreshTokenRef,
};

/// A grant presented to the token endpoint
pub(super) trait Grant {
    /// The grant type or flow to be performed
    fn grant_type() -> &'static str;
    /// The client ID of the client making the request
    fn client_id(&self) -> &ClientIdRef;
    /// The form body, in wire order
    fn form(&self) -> Vec<(&str, &str)>;
}

/// Exchange of an authorization code delivered to the redirect URI
#[derive(Debug)]
pub(super) struct AuthorizationCodeGrant<'a> {
    pub code: &'a AuthorizationCodeRef,
    pub client_id: &'a ClientIdRef,
    pub client_secret: &'a ClientSecretRef,
    pub redirect_uri: &'a str,
}

impl Grant for AuthorizationCodeGrant<'_> {
    fn grant_type() -> &'static str {
        "authorization_code"
    }

    fn client_id(&self) -> &ClientIdRef {
        self.client_id
    }

    fn form(&self) -> Vec<(&str, &str)> {
        vec![
            ("grant_type", Self::grant_type()),
            ("code", self.code.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri),
        ]
    }
}

/// Exchange of a refresh token for a new set of tokens
#[derive(Debug)]
pub(super) struct RefreshTokenGrant<'a> {
    pub refresh_token: &'a RefreshTokenRef,
    pub client_id: &'a ClientIdRef,
    pub client_secret: &'a ClientSecretRef,
}

impl Grant for RefreshTokenGrant<'_> {
    fn grant_type() -> &'static str {
        "refresh_token"
    }

    fn client_id(&self) -> &ClientIdRef {
        self.client_id
    }

    fn form(&self) -> Vec<(&str, &str)> {
        vec![
            ("grant_type", Self::grant_type()),
            ("refresh_token", self.refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ]
    }
}

/// A successful response from the token endpoint
///
/// A missing `expires_in` is read as zero, so the access token is treated as
/// expired as soon as it is received.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    #[serde(default)]
    pub id_token: Option<IdToken>,
    #[serde(default)]
    #[allow(dead_code)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_grant_form_is_in_wire_order() {
        let code = crate::AuthorizationCode::from_static("CODE");
        let client_id = crate::ClientId::from_static("my-client");
        let client_secret = crate::ClientSecret::from_static("shh");
        let grant = AuthorizationCodeGrant {
            code: &code,
            client_id: &client_id,
            client_secret: &client_secret,
            redirect_uri: "https://app.example/cb",
        };

        assert_eq!(
            grant.form(),
            vec![
                ("grant_type", "authorization_code"),
                ("code", "CODE"),
                ("client_id", "my-client"),
                ("client_secret", "shh"),
                ("redirect_uri", "https://app.example/cb"),
            ]
        );
    }

    #[test]
    fn refresh_grant_form_is_in_wire_order() {
        let refresh_token = RefreshToken::from_static("RT1");
        let client_id = crate::ClientId::from_static("my-client");
        let client_secret = crate::ClientSecret::from_static("shh");
        let grant = RefreshTokenGrant {
            refresh_token: &refresh_token,
            client_id: &client_id,
            client_secret: &client_secret,
        };

        assert_eq!(
            grant.form(),
            vec![
                ("grant_type", "refresh_token"),
                ("refresh_token", "RT1"),
                ("client_id", "my-client"),
                ("client_secret", "shh"),
            ]
        );
    }

    #[test]
    fn response_reads_standard_refresh_token_key() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{"access_token":"AT1","refresh_token":"RT1","id_token":"ID1","token_type":"Bearer","expires_in":3600}"#,
        )
        .unwrap();

        assert_eq!(resp.access_token.as_str(), "AT1");
        assert_eq!(resp.refresh_token.as_ref().map(|r| r.as_str()), Some("RT1"));
        assert_eq!(resp.id_token.as_ref().map(|i| i.as_str()), Some("ID1"));
        assert_eq!(resp.expires_in, 3600);
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let resp: TokenResponse = serde_json::from_str(r#"{"access_token":"AT1"}"#).unwrap();

        assert!(resp.refresh_token.is_none());
        assert!(resp.id_token.is_none());
        assert_eq!(resp.expires_in, 0);
    }

    #[test]
    fn response_requires_access_token() {
        let resp = serde_json::from_str::<TokenResponse>(r#"{"refresh_oken":"RT1"}"#);
        assert!(resp.is_err());
    }
}
