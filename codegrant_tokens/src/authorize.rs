//! Construction of the authorization request that starts the flow

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;

use crate::{ClientIdRef, CsrfState, CsrfStateRef};

/// Everything outside the RFC 3986 unreserved set is escaped, so a space
/// becomes `%20` rather than `+`
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// An authorization request URL along with the `state` value it carries
///
/// The client does not remember the `state`. To protect against cross-site
/// request forgery, hold on to it until the user agent returns to the
/// redirect URI and check the echoed value with [`CsrfStateRef::verify()`].
#[derive(Clone, Debug)]
pub struct AuthorizationUrl {
    url: Url,
    state: CsrfState,
}

impl AuthorizationUrl {
    pub(crate) fn new(
        authorization_endpoint: &Url,
        client_id: &ClientIdRef,
        redirect_uri: &str,
        scope: &str,
    ) -> Self {
        let state = generate_state();

        let params = [
            ("response_type", "code"),
            ("client_id", client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope),
            ("state", state.as_str()),
        ];

        let mut query = match authorization_endpoint.query() {
            Some(existing) if !existing.is_empty() => format!("{}&", existing),
            _ => String::new(),
        };
        for (i, (key, value)) in params.iter().enumerate() {
            if i > 0 {
                query.push('&');
            }
            query.push_str(key);
            query.push('=');
            query.extend(utf8_percent_encode(value, QUERY_VALUE));
        }

        let mut url = authorization_endpoint.clone();
        url.set_query(Some(&query));

        Self { url, state }
    }

    /// The URL to send the user agent to
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL as a string
    #[inline]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The `state` value included in the request
    #[inline]
    pub fn state(&self) -> &CsrfStateRef {
        &self.state
    }

    /// Splits into the URL and the `state` value
    pub fn into_parts(self) -> (Url, CsrfState) {
        (self.url, self.state)
    }

    /// Discards the `state` value, keeping only the URL
    pub fn into_url(self) -> Url {
        self.url
    }
}

impl fmt::Display for AuthorizationUrl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl From<AuthorizationUrl> for Url {
    fn from(auth: AuthorizationUrl) -> Self {
        auth.url
    }
}

/// A fresh v4 UUID without separators
fn generate_state() -> CsrfState {
    CsrfState::new(uuid::Uuid::new_v4().simple().to_string())
}
