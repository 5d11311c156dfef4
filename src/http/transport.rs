//! The seam between the load runner and the HTTP stack.
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use thiserror::Error;

use crate::args::HttpMethod;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Lazily readable response body. Nothing is read until asked for.
#[async_trait]
pub trait ResponseBody: Send {
    /// Reads the remaining body as text.
    ///
    /// # Errors
    ///
    /// Returns an error when the body stream fails or cannot be decoded.
    async fn read_text(self: Box<Self>) -> Result<String, TransportError>;
}

/// A response whose headers have arrived; the body is still pending.
pub struct TransportResponse {
    status: u16,
    reason: String,
    body: Box<dyn ResponseBody>,
}

impl TransportResponse {
    #[must_use]
    pub fn new(status: u16, reason: impl Into<String>, body: Box<dyn ResponseBody>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body,
        }
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// 2xx and 3xx count as success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 400
    }

    /// Reads the body as text.
    ///
    /// # Errors
    ///
    /// Returns an error when the body cannot be read.
    pub async fn read_text(self) -> Result<String, TransportError> {
        self.body.read_text().await
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Redirect,
    Builder,
    Other,
}

impl TransportErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "TimeoutError",
            TransportErrorKind::Connect => "ConnectError",
            TransportErrorKind::Request => "RequestError",
            TransportErrorKind::Body => "BodyError",
            TransportErrorKind::Decode => "DecodeError",
            TransportErrorKind::Redirect => "RedirectError",
            TransportErrorKind::Builder => "BuilderError",
            TransportErrorKind::Other => "TransportError",
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection or protocol level failure. Never fatal to a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_builder() {
            TransportErrorKind::Builder
        } else if err.is_redirect() {
            TransportErrorKind::Redirect
        } else if err.is_body() {
            TransportErrorKind::Body
        } else if err.is_decode() {
            TransportErrorKind::Decode
        } else if err.is_request() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// Sends requests on behalf of every worker. Implementations are shared
/// across workers and must not hold per-request state.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and resolves once response headers have arrived.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] for connection or protocol failures.
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let url = Url::parse(&request.url).map_err(|err| {
            TransportError::new(
                TransportErrorKind::Builder,
                format!("Invalid URL '{}': {}", request.url, err),
            )
        })?;
        let mut builder = self.client.request(to_reqwest_method(request.method), url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default();
        Ok(TransportResponse::new(
            status.as_u16(),
            reason,
            Box::new(ReqwestBody(response)),
        ))
    }
}

struct ReqwestBody(reqwest::Response);

#[async_trait]
impl ResponseBody for ReqwestBody {
    async fn read_text(self: Box<Self>) -> Result<String, TransportError> {
        self.0.text().await.map_err(TransportError::from)
    }
}

pub(crate) fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}
