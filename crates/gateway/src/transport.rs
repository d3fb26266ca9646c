//! Transport and suspension seams of the gateway client.
//!
//! [`Transport`] performs exactly one outbound POST; [`Sleeper`] performs the
//! back-off wait. The client owns retry, timeout, classification and redaction,
//! so both seams stay trivial and tests can replace them with scripted fakes.

use std::error::Error as _;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// Descriptive fragments (lowercase) that mark a transport failure as a
/// connectivity problem worth retrying.
const NETWORK_INDICATORS: &[&str] = &[
    "abort",
    "cancel",
    "network",
    "connection refused",
    "econnrefused",
    "connection reset",
    "econnreset",
    "timed out",
    "timeout",
    "etimedout",
    "socket",
];

/// Status line and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl TransportResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Broad category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The exchange exceeded a deadline.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// Sending the request failed after the connection was set up.
    Request,
    /// Reading the response body failed.
    Body,
    /// Anything else (malformed URL, TLS configuration, ...).
    Other,
}

/// A transport-level failure: no HTTP status was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    /// Creates a transport error.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error description.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this failure is connectivity-related and may succeed
    /// on a later attempt.
    ///
    /// Decided by category first, then by the descriptive text.
    pub fn is_network(&self) -> bool {
        match self.kind {
            TransportErrorKind::Timeout
            | TransportErrorKind::Connect
            | TransportErrorKind::Request => true,
            TransportErrorKind::Body | TransportErrorKind::Other => {
                let lower = self.message.to_ascii_lowercase();
                NETWORK_INDICATORS.iter().any(|needle| lower.contains(needle))
            }
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_request() {
            TransportErrorKind::Request
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };

        // reqwest's top-level message is generic ("error sending request");
        // the cause chain carries the OS-level reason.
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self { kind, message }
    }
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Performs a single outbound POST of a JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs `body` to `url` with `Content-Type: application/json`.
    async fn post(&self, url: &str, body: &str) -> Result<TransportResponse, TransportError>;
}

/// Suspends the current task between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits for `duration` without blocking other tasks.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cournot-resolver/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, url: &str, body: &str) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_owned())
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_decide_before_text() {
        assert!(TransportError::new(TransportErrorKind::Connect, "whatever").is_network());
        assert!(TransportError::new(TransportErrorKind::Timeout, "").is_network());
        assert!(!TransportError::new(TransportErrorKind::Other, "builder error").is_network());
    }

    #[test]
    fn descriptive_text_is_recognised() {
        for message in [
            "The operation was aborted",
            "NetworkError when attempting to fetch resource",
            "connect ECONNREFUSED 127.0.0.1:443",
            "Connection reset by peer",
            "operation timed out",
            "socket hang up",
        ] {
            assert!(
                TransportError::new(TransportErrorKind::Other, message).is_network(),
                "{message}"
            );
        }
        assert!(!TransportError::new(TransportErrorKind::Body, "invalid utf-8").is_network());
    }

    #[test]
    fn success_is_2xx_only() {
        let ok = TransportResponse { status: 204, body: String::new() };
        let redirect = TransportResponse { status: 302, body: String::new() };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }
}
