use std::error;

use reqwest::StatusCode;
use thiserror::Error;

/// An error while obtaining tokens from the authority
#[derive(Debug, Error)]
pub enum TokenClientError {
    /// The authority rejected the authorization code exchange
    ///
    /// This is an expected outcome when the user presents a stale or
    /// already-used code.
    #[error("authority rejected authorization code ({status}): {body}")]
    TokenRequestFailed {
        /// The status returned by the authority
        status: StatusCode,
        /// The body of the error
        body: String,
    },
    /// The authority rejected the refresh token request
    #[error("authority rejected refresh token request ({status}): {body}")]
    RefreshFailed {
        /// The status returned by the authority
        status: StatusCode,
        /// The body of the error
        body: String,
    },
    /// No valid access token is held and none can be obtained by refreshing
    ///
    /// The authorization code flow must be started over.
    #[error("no access token available; authorization is required")]
    Unauthenticated,
    /// Unable to deserialize the token body
    #[error("error deserializing token body from authority")]
    MalformedResponse(#[from] serde_json::Error),
    /// The authority returned an empty access token
    #[error("authority returned an empty access token")]
    EmptyAccessToken,
    /// Unable to exchange a request with the authority
    #[error("error sending request to authority")]
    Transport(#[source] Box<dyn error::Error + Send + Sync + 'static>),
}

impl TokenClientError {
    /// Whether the authority itself turned down the request, as opposed to
    /// the request or response failing in transit
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::TokenRequestFailed { .. } | Self::RefreshFailed { .. }
        )
    }
}

/// An error while constructing a client from configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An endpoint is not a valid absolute URL
    #[error("invalid {name} endpoint")]
    InvalidEndpoint {
        /// Which endpoint failed to parse
        name: &'static str,
        /// The underlying parse error
        source: url::ParseError,
    },
}
