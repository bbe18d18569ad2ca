use std::future::Future;

use reqwest::StatusCode;
use url::Url;

use super::config::ClientConfig;
use crate::error::Error;
use crate::types::{HandshakeRequest, HandshakeResponse, IdentityAssertion, endpoints};

/// The three backend calls the client side needs.
///
/// [`HttpBackend`] is the real implementation; tests and alternative
/// transports can provide their own.
pub trait SessionBackend: Send + Sync + 'static {
    /// `POST /api/auth/handshake`. A 401 is [`Error::HandshakeRejected`].
    fn handshake(
        &self,
        assertion: &IdentityAssertion,
    ) -> impl Future<Output = Result<HandshakeResponse, Error>> + Send;

    /// `POST /api/auth/heartbeat`. A 401 is [`Error::SessionRejected`].
    fn touch(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// `POST /api/auth/logout`.
    fn logout(&self) -> impl Future<Output = Result<(), Error>> + Send;
}

/// reqwest-backed [`SessionBackend`].
///
/// Keeps its own cookie store so the `Set-Cookie` from the handshake is
/// replayed on heartbeat and logout.
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            http,
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    /// It needs a cookie store for the session to survive between calls.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid endpoint {path}: {e}")))
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(match (operation, status) {
            ("handshake", StatusCode::UNAUTHORIZED) => Error::HandshakeRejected(body),
            (_, StatusCode::UNAUTHORIZED) => Error::SessionRejected,
            _ => Error::Backend {
                operation,
                status: status.as_u16(),
                detail: body,
            },
        })
    }

    async fn post(&self, path: &str, operation: &'static str) -> Result<reqwest::Response, Error> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .send()
            .await
            .map_err(|e| transport_error(e, operation))?;
        Self::ensure_success(response, operation).await
    }
}

fn transport_error(e: reqwest::Error, operation: &'static str) -> Error {
    if e.is_timeout() {
        Error::Timeout { operation }
    } else {
        Error::Http(e)
    }
}

impl SessionBackend for HttpBackend {
    async fn handshake(&self, assertion: &IdentityAssertion) -> Result<HandshakeResponse, Error> {
        let body = HandshakeRequest {
            assertion: assertion.clone(),
        };
        let response = self
            .http
            .post(self.endpoint(endpoints::HANDSHAKE)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, "handshake"))?;

        let response = Self::ensure_success(response, "handshake").await?;
        response.json::<HandshakeResponse>().await.map_err(Into::into)
    }

    async fn touch(&self) -> Result<(), Error> {
        self.post(endpoints::HEARTBEAT, "heartbeat").await.map(drop)
    }

    async fn logout(&self) -> Result<(), Error> {
        self.post(endpoints::LOGOUT, "logout").await.map(drop)
    }
}
