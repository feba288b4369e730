//! Client-side token management for the OAuth2 authorization code grant
//!
//! A [`TokenClient`] holds the credentials issued to a client by an
//! authority, along with the tokens obtained on behalf of a user. It covers
//! the whole life of those tokens:
//!
//! 1. Build the URL to send the user agent to with
//!    [`authorization_url()`][TokenClient::authorization_url].
//! 2. When the user agent returns to the redirect URI with an authorization
//!    code, check the `state` and trade the code for tokens with
//!    [`exchange_code()`][TokenClient::exchange_code].
//! 3. Whenever an access token is needed, ask for one with
//!    [`valid_access_token()`][TokenClient::valid_access_token]. If the held
//!    access token has expired, it is refreshed first using the refresh token.
//!
//! Expiry is tracked from the `expires_in` lifetime granted by the authority,
//! measured from the time the token response was received. Tokens are never
//! decoded.
//!
//! ```
//! use codegrant_tokens::{AuthorizationCode, ClientId, ClientSecret, TokenClient};
//! use reqwest::Url;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TokenClient::new(
//!     ClientId::from_static("my-client"),
//!     ClientSecret::from_static("my-secret"),
//!     Url::parse("https://idp.example/authorize")?,
//!     Url::parse("https://idp.example/token")?,
//! );
//!
//! let auth = client.authorization_url("https://app.example/cb", "openid profile");
//! println!("visit {}", auth);
//!
//! // ...the user agent returns to https://app.example/cb?code=...&state=...
//! # let (returned_state, code) = (auth.state().as_str().to_owned(), "code");
//! auth.state().verify(&returned_state)?;
//!
//! if client
//!     .exchange_code(&AuthorizationCode::new(code.to_owned()), "https://app.example/cb")
//!     .await?
//! {
//!     let token = client.valid_access_token().await?;
//!     println!("access token: {:#10}", token);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Tokens are not persisted. To carry tokens across restarts, capture them
//! with [`token_state()`][TokenClient::token_state], which is serializable,
//! and hand them back with
//! [`restore_token_state()`][TokenClient::restore_token_state].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod authorize;
mod braids;
mod client;
mod error;
mod tokens;
pub mod transport;

pub use authorize::AuthorizationUrl;
pub use braids::*;
pub use client::{TokenClient, TokenClientConfig};
pub use error::{ConfigError, TokenClientError};
pub use tokens::{TokenState, TokenStatus};
