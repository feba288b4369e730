//! A token client that uses an OAuth2 server as an authority

use std::fmt;

use codegrant_clock::{Clock, System};
use reqwest::Url;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    transport::TokenTransport, AccessToken, AuthorizationCodeRef, AuthorizationUrl, ClientId,
    ClientSecret, ConfigError, TokenClientError, TokenState, TokenStatus,
};

mod dto;

use dto::Grant;

/// Configuration for a [`TokenClient`]
#[derive(Clone, Debug, Deserialize)]
pub struct TokenClientConfig {
    /// The client ID issued by the authority
    pub client_id: ClientId,
    /// The client secret issued by the authority
    pub client_secret: ClientSecret,
    /// The authority's authorization endpoint
    pub authorization_endpoint: String,
    /// The authority's token endpoint
    pub token_endpoint: String,
}

/// A client for the OAuth2 authorization code grant
///
/// Holds the client credentials, the authority's endpoints, and the tokens
/// obtained so far. Tokens are only ever replaced by a successful exchange
/// with the authority; a failed exchange leaves them as they were.
///
/// Token state sits behind a single lock which is held across the exchange
/// with the authority. Callers racing on an expired token therefore cause
/// one refresh, and all of them observe its result.
pub struct TokenClient<T = reqwest::Client, C = System> {
    client_id: ClientId,
    client_secret: ClientSecret,
    authorization_endpoint: Url,
    token_endpoint: Url,
    tokens: Mutex<Option<TokenState>>,
    transport: T,
    clock: C,
}

impl TokenClient {
    /// Constructs a new client using a default `reqwest` client and the
    /// system clock
    pub fn new(
        client_id: ClientId,
        client_secret: ClientSecret,
        authorization_endpoint: Url,
        token_endpoint: Url,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            authorization_endpoint,
            token_endpoint,
            tokens: Mutex::new(None),
            transport: reqwest::Client::new(),
            clock: System,
        }
    }

    /// Constructs a new client from configuration
    pub fn from_config(config: TokenClientConfig) -> Result<Self, ConfigError> {
        let authorization_endpoint =
            Url::parse(&config.authorization_endpoint).map_err(|source| {
                ConfigError::InvalidEndpoint {
                    name: "authorization",
                    source,
                }
            })?;
        let token_endpoint =
            Url::parse(&config.token_endpoint).map_err(|source| ConfigError::InvalidEndpoint {
                name: "token",
                source,
            })?;

        Ok(Self::new(
            config.client_id,
            config.client_secret,
            authorization_endpoint,
            token_endpoint,
        ))
    }
}

impl<T, C> TokenClient<T, C> {
    /// Replaces the transport used to reach the token endpoint
    pub fn with_transport<U>(self, transport: U) -> TokenClient<U, C> {
        TokenClient {
            client_id: self.client_id,
            client_secret: self.client_secret,
            authorization_endpoint: self.authorization_endpoint,
            token_endpoint: self.token_endpoint,
            tokens: self.tokens,
            transport,
            clock: self.clock,
        }
    }

    /// Sets a custom clock to be used
    ///
    /// Useful for testing purposes
    pub fn with_clock<D>(self, clock: D) -> TokenClient<T, D> {
        TokenClient {
            client_id: self.client_id,
            client_secret: self.client_secret,
            authorization_endpoint: self.authorization_endpoint,
            token_endpoint: self.token_endpoint,
            tokens: self.tokens,
            transport: self.transport,
            clock,
        }
    }

    /// The client ID presented to the authority
    #[inline]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// The authority's authorization endpoint
    #[inline]
    pub fn authorization_endpoint(&self) -> &Url {
        &self.authorization_endpoint
    }

    /// The authority's token endpoint
    #[inline]
    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    /// Builds the URL to send the user agent to in order to obtain an
    /// authorization code
    ///
    /// `scope` is a space-delimited list of scopes. A fresh `state` value is
    /// generated on every call; see [`AuthorizationUrl`] for verifying it
    /// when the user agent returns.
    pub fn authorization_url(&self, redirect_uri: &str, scope: &str) -> AuthorizationUrl {
        AuthorizationUrl::new(
            &self.authorization_endpoint,
            &self.client_id,
            redirect_uri,
            scope,
        )
    }

    /// Captures the tokens currently held, if any
    pub async fn token_state(&self) -> Option<TokenState> {
        self.tokens.lock().await.clone()
    }

    /// Replaces the tokens currently held with a previously captured set
    pub async fn restore_token_state(&self, state: TokenState) {
        tracing::debug!(
            expiry = state.expiry().0,
            has_refresh_token = state.refresh_token().is_some(),
            "restored token state"
        );
        *self.tokens.lock().await = Some(state);
    }
}

impl<T, C> TokenClient<T, C>
where
    T: TokenTransport,
    C: Clock + Send + Sync,
{
    /// Exchanges an authorization code for tokens
    ///
    /// `redirect_uri` must be the same value used to build the authorization
    /// URL. Returns `Ok(false)` if the authority rejects the code, which happens
    /// in the ordinary course of things when a code is stale or reused. Failing
    /// to reach the authority, or a success response which cannot be read as
    /// tokens, is reported as an error. Either way, the tokens held are
    /// unchanged unless `Ok(true)` is returned.
    pub async fn exchange_code(
        &self,
        code: &AuthorizationCodeRef,
        redirect_uri: &str,
    ) -> Result<bool, TokenClientError> {
        match self.exchange_code_checked(code, redirect_uri).await {
            Ok(()) => Ok(true),
            Err(TokenClientError::TokenRequestFailed { status, body }) => {
                tracing::warn!(
                    response.status = status.as_u16(),
                    response.body = %body,
                    "authority rejected authorization code"
                );
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    /// Exchanges an authorization code for tokens, reporting a rejection by
    /// the authority as [`TokenClientError::TokenRequestFailed`]
    ///
    /// On success, all held tokens are replaced, including any refresh token
    /// from an earlier authorization.
    pub async fn exchange_code_checked(
        &self,
        code: &AuthorizationCodeRef,
        redirect_uri: &str,
    ) -> Result<(), TokenClientError> {
        let mut tokens = self.tokens.lock().await;

        let grant = dto::AuthorizationCodeGrant {
            code,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri,
        };

        let new_tokens = request_token(
            &self.transport,
            &self.token_endpoint,
            &grant,
            &self.clock,
            |status, body| TokenClientError::TokenRequestFailed { status, body },
        )
        .await?;

        *tokens = Some(new_tokens);

        Ok(())
    }

    /// Gets an access token that is valid now
    ///
    /// If the held access token has expired and a refresh token is available,
    /// the tokens are refreshed first. Fails with
    /// [`Unauthenticated`][TokenClientError::Unauthenticated] if no
    /// authorization code has been exchanged yet.
    pub async fn valid_access_token(&self) -> Result<AccessToken, TokenClientError> {
        let mut tokens = self.tokens.lock().await;

        let current = match tokens.as_ref() {
            Some(current) => current,
            None => return Err(TokenClientError::Unauthenticated),
        };

        let now = self.clock.now();
        if current.is_valid_at(now) {
            tracing::trace!(
                until_expired = current.until_expired_at(now).0,
                "using held access token"
            );
            return Ok(current.access_token().to_owned());
        }

        let refresh_token = match current.refresh_token() {
            Some(refresh_token) => refresh_token,
            None => {
                tracing::debug!("access token expired and no refresh token is held");
                return Err(TokenClientError::Unauthenticated);
            }
        };

        tracing::debug!(
            expired_for = (now - current.expiry()).0,
            "access token expired, refreshing"
        );

        let grant = dto::RefreshTokenGrant {
            refresh_token,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
        };

        let new_tokens = request_token(
            &self.transport,
            &self.token_endpoint,
            &grant,
            &self.clock,
            |status, body| TokenClientError::RefreshFailed { status, body },
        )
        .await?;

        let access_token = new_tokens.access_token().to_owned();

        *tokens = Some(match tokens.take() {
            Some(old) => old.superseded_by(new_tokens),
            None => new_tokens,
        });

        Ok(access_token)
    }

    /// Gets the lifecycle status of the held tokens as of now
    pub async fn status(&self) -> TokenStatus {
        match self.tokens.lock().await.as_ref() {
            Some(tokens) => tokens.token_status_with_clock(&self.clock),
            None => TokenStatus::Unauthenticated,
        }
    }
}

impl<T, C> fmt::Debug for TokenClient<T, C>
where
    T: fmt::Debug,
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret)
            .field("authorization_endpoint", &self.authorization_endpoint.as_str())
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("tokens", &self.tokens)
            .field("transport", &self.transport)
            .field("clock", &self.clock)
            .finish()
    }
}

#[tracing::instrument(
    level = "debug",
    err(level = "debug"),
    skip(transport, token_url, grant, clock, rejected),
    fields(
        token_url = %token_url,
        grant_type = G::grant_type(),
        client_id = %grant.client_id(),
    ),
)]
async fn request_token<X, G, C, R>(
    transport: &X,
    token_url: &Url,
    grant: &G,
    clock: &C,
    rejected: R,
) -> Result<TokenState, TokenClientError>
where
    X: TokenTransport,
    G: Grant,
    C: Clock,
    R: FnOnce(reqwest::StatusCode, String) -> TokenClientError,
{
    tracing::trace!("requesting token from authority");

    let resp = transport
        .post_form(token_url, &grant.form())
        .await
        .map_err(|error| TokenClientError::Transport(Box::new(error)))?;

    let issued = clock.now();

    tracing::debug!(
        response.status = resp.status.as_u16(),
        "received token response from issuing authority"
    );

    if !resp.status.is_success() {
        return Err(rejected(resp.status, resp.body_text()));
    }

    let body: dto::TokenResponse = serde_json::from_slice(&resp.body)?;

    if body.access_token.as_str().is_empty() {
        return Err(TokenClientError::EmptyAccessToken);
    }

    let token = TokenState::new(
        body.access_token,
        body.refresh_token,
        body.id_token,
        issued,
        body.expires_in,
    );

    tracing::info!(
        has_id_token = token.id_token().is_some(),
        has_refresh_token = token.refresh_token().is_some(),
        lifetime = token.lifetime().0,
        expiry = token.expiry().0,
        "received new tokens"
    );

    Ok(token)
}
