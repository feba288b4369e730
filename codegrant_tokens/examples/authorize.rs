use std::time::Duration;

use clap::Parser;
use codegrant_tokens::{
    AuthorizationCode, ClientId, ClientSecret, TokenClient, TokenClientError, TokenStatus,
};
use color_eyre::eyre::{eyre, WrapErr};
use reqwest::Url;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time,
};

#[derive(Debug, Parser)]
struct Opts {
    /// The issuing authority's authorization URL
    #[arg(short, long, env)]
    authorization_url: Url,

    /// The issuing authority's token request URL
    #[arg(short, long, env)]
    token_url: Url,

    /// The client ID of the client
    #[arg(short, long, env)]
    client_id: String,

    /// The client secret used to identify the client to the issuing authority
    #[arg(short = 's', long, env, hide_env_values = true)]
    client_secret: String,

    /// The URI the authority will redirect the user agent back to
    #[arg(short, long, env)]
    redirect_uri: String,

    /// Space-delimited scopes to request
    #[arg(long, env, default_value = "openid profile offline_access")]
    scope: String,

    /// How often to ask for a valid access token, in seconds
    #[arg(long, default_value_t = 30)]
    interval: u64,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let client = TokenClient::new(
        ClientId::new(opts.client_id),
        ClientSecret::new(opts.client_secret),
        opts.authorization_url,
        opts.token_url,
    );

    let auth = client.authorization_url(&opts.redirect_uri, &opts.scope);
    println!("Open this URL in a browser and authorize the client:\n\n    {auth}\n");
    println!("Then paste the full URL you were redirected to:");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    let redirected = Url::parse(line.trim()).wrap_err("redirected URL is not a valid URL")?;

    let param = |name: &str| {
        redirected
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(eyre!("authority refused authorization: {error}"));
    }

    let returned_state = param("state").ok_or_else(|| eyre!("redirect is missing `state`"))?;
    auth.state().verify(&returned_state)?;

    let code = param("code").ok_or_else(|| eyre!("redirect is missing `code`"))?;
    if !client
        .exchange_code(&AuthorizationCode::new(code), &opts.redirect_uri)
        .await?
    {
        return Err(eyre!("authority rejected the authorization code"));
    }

    let mut interval = time::interval(Duration::from_secs(opts.interval));
    loop {
        interval.tick().await;

        let status = client.status().await;
        match client.valid_access_token().await {
            Ok(token) => {
                tracing::info!(
                    ?status,
                    token = format_args!("{:#?}", token),
                    "pulled token"
                )
            }
            Err(error @ TokenClientError::Unauthenticated) => {
                return Err(error.into());
            }
            Err(error) => {
                tracing::error!(
                    ?status,
                    error = (&error as &dyn std::error::Error),
                    "unable to obtain a valid token"
                )
            }
        }

        if status == TokenStatus::Expired {
            if let Some(state) = client.token_state().await {
                tracing::debug!(expiry = state.expiry().0, "tokens refreshed");
            }
        }
    }
}
