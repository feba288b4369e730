//! The HTTP collaborator used to reach the token endpoint
//!
//! Connection reuse, TLS, redirects, and timeouts are all the responsibility
//! of the transport. The token client only needs a way to POST a form and
//! read back a status and a body.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, StatusCode, Url};
use std::error;

/// A raw response from the token endpoint
#[derive(Clone, Debug)]
pub struct TransportResponse {
    /// The HTTP status of the response
    pub status: StatusCode,
    /// The undecoded response body
    pub body: Bytes,
}

impl TransportResponse {
    /// The body as text, lossily decoded, for diagnostics
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A transport able to POST form-encoded bodies
#[async_trait]
pub trait TokenTransport: Send + Sync {
    /// The error type returned in the event that the exchange fails in transit
    type Error: error::Error + Send + Sync + 'static;

    /// POSTs `form` as `application/x-www-form-urlencoded` to `url`
    ///
    /// Pairs are encoded in the order given.
    async fn post_form(
        &self,
        url: &Url,
        form: &[(&str, &str)],
    ) -> Result<TransportResponse, Self::Error>;
}

#[async_trait]
impl TokenTransport for reqwest::Client {
    type Error = reqwest::Error;

    async fn post_form(
        &self,
        url: &Url,
        form: &[(&str, &str)],
    ) -> Result<TransportResponse, Self::Error> {
        let resp = self
            .post(url.clone())
            .header(header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl<T: TokenTransport + ?Sized> TokenTransport for std::sync::Arc<T> {
    type Error = T::Error;

    async fn post_form(
        &self,
        url: &Url,
        form: &[(&str, &str)],
    ) -> Result<TransportResponse, Self::Error> {
        (**self).post_form(url, form).await
    }
}
