use codegrant_clock::{Clock, DurationSecs, UnixTime};
use serde::{Deserialize, Serialize};

use crate::{AccessToken, AccessTokenRef, IdToken, IdTokenRef, RefreshToken, RefreshTokenRef};

/// The tokens held by a client, along with when the access token was issued
/// and when it expires
///
/// This is the unit of persistence: it can be captured from a client with
/// [`TokenClient::token_state()`][crate::TokenClient::token_state], stored by the
/// application however it sees fit, and handed back with
/// [`TokenClient::restore_token_state()`][crate::TokenClient::restore_token_state].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    access_token: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<RefreshToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id_token: Option<IdToken>,
    issued: UnixTime,
    expiry: UnixTime,
}

/// A client's token lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
    /// No token exchange has completed yet
    Unauthenticated,
    /// The access token can be used
    Valid,
    /// The access token is past its expiry and must be refreshed before use
    Expired,
}

impl TokenState {
    /// Constructs a token state for tokens received at `issued`
    ///
    /// The expiry is `issued` offset by `lifetime` seconds. A zero or negative
    /// lifetime produces a token which is already expired.
    pub fn new(
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
        id_token: Option<IdToken>,
        issued: UnixTime,
        lifetime: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            id_token,
            issued,
            expiry: issued.saturating_add_signed(lifetime),
        }
    }

    /// Gets the current access token
    #[inline]
    pub fn access_token(&self) -> &AccessTokenRef {
        &self.access_token
    }

    /// Gets the current refresh token, if available
    #[inline]
    pub fn refresh_token(&self) -> Option<&RefreshTokenRef> {
        self.refresh_token.as_deref()
    }

    /// Gets the current ID token, if available
    #[inline]
    pub fn id_token(&self) -> Option<&IdTokenRef> {
        self.id_token.as_deref()
    }

    /// Gets the time that the tokens were received
    #[inline]
    pub fn issued(&self) -> UnixTime {
        self.issued
    }

    /// Gets the time after which the access token must not be used
    #[inline]
    pub fn expiry(&self) -> UnixTime {
        self.expiry
    }

    /// Gets the token's lifetime as granted by the authority
    #[inline]
    pub fn lifetime(&self) -> DurationSecs {
        self.expiry - self.issued
    }

    /// Whether the access token is still usable as of the provided time
    #[inline]
    pub fn is_valid_at(&self, time: UnixTime) -> bool {
        time < self.expiry
    }

    /// Gets the token's lifetime status based on the current time
    /// as reported by the provided clock
    #[inline]
    pub fn token_status_with_clock<C: Clock>(&self, clock: &C) -> TokenStatus {
        self.token_status_at(clock.now())
    }

    /// Gets the token's lifetime status as of the provided time
    #[inline]
    pub fn token_status_at(&self, time: UnixTime) -> TokenStatus {
        if self.is_valid_at(time) {
            TokenStatus::Valid
        } else {
            TokenStatus::Expired
        }
    }

    /// Gets a duration for how much longer the token would be valid as of the
    /// provided time
    #[inline]
    pub fn until_expired_at(&self, time: UnixTime) -> DurationSecs {
        self.expiry - time
    }

    /// Folds in a newer set of tokens
    ///
    /// Authorities that do not rotate refresh tokens omit one from the refresh
    /// response, in which case the current refresh token stays in place.
    pub(crate) fn superseded_by(self, mut newer: TokenState) -> TokenState {
        if newer.refresh_token.is_none() {
            newer.refresh_token = self.refresh_token;
        }
        newer
    }
}
