//! Cournot gateway adapter.
//!
//! Implements the [`pipeline::Gateway`] trait against the single Cournot
//! interface endpoint: every logical call is wrapped in an [`envelope`] and
//! POSTed to [`DEFAULT_GATEWAY_URL`] (or the configured override).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, envelope framing, timeout enforcement,
//! transient-vs-fatal classification, exponential back-off, and credential
//! redaction all live here. The [`pipeline`] crate sees only
//! [`pipeline::Gateway`] and [`pipeline::GatewayError`].
//!
//! ## Seams
//!
//! [`GatewayClient::with_parts`] accepts any [`Transport`] and [`Sleeper`], so
//! the retry loop can be exercised without a network or a clock.

pub mod client;
pub mod config;
pub mod credential;
pub mod envelope;
pub mod transport;

pub use client::{is_transient_status, ClientBuildError, GatewayClient};
pub use config::{
    GatewayConfig, BACKOFF_BASE, BACKOFF_CAP, DEFAULT_GATEWAY_URL, GATEWAY_URL_ENV, MAX_ATTEMPTS,
    REQUEST_TIMEOUT,
};
pub use credential::{Credential, Redactor, REDACTION_MARKER};
pub use envelope::Envelope;
pub use transport::{
    ReqwestTransport, Sleeper, TokioSleeper, Transport, TransportError, TransportErrorKind,
    TransportResponse,
};
