//! Error and retry-policy types for the resolver domain.
//!
//! [`GatewayError`] is the failure vocabulary of the [`crate::Gateway`] port:
//! every gateway implementation maps its transport outcomes onto it.
//! [`PipelineError`] covers conditions that abort a whole run.
//!
//! [`RetryPolicy`] is a cross-cutting concern: the gateway's retry loop asks
//! each [`GatewayError`] for its policy rather than matching variants itself.
//!
//! Every message carried by these types has already been passed through
//! credential redaction by the component that produced it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StepName;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry.
///
/// ## Rules
///
/// - `Retryable` errors: HTTP 5xx, 429, 408, and connectivity failures
///   (refused, reset, aborted, timed out).
/// - `NonRetryable` errors: any other HTTP status, undecodable success bodies,
///   unrecognised transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried on the caller's back-off schedule.
    Retryable,
    /// The operation must not be retried.
    NonRetryable,
}

impl RetryPolicy {
    /// Returns `true` for [`RetryPolicy::Retryable`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, RetryPolicy::Retryable)
    }
}

// ---------------------------------------------------------------------------
// Gateway errors
// ---------------------------------------------------------------------------

/// Failures of a single logical gateway call (which may span several attempts).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The gateway answered with a status that retrying cannot fix
    /// (any non-success status other than 5xx, 429 and 408).
    #[error("Gateway request failed with status {status}: {body}")]
    Fatal {
        /// HTTP status code.
        status: u16,
        /// Response body, redacted.
        body: String,
    },

    /// The gateway answered with a transient status on the final attempt.
    ///
    /// Also used as the "last error" between attempts; it is only surfaced
    /// once the attempt budget is spent.
    #[error("Gateway request failed with status {status} after {attempts} attempt(s): {body}")]
    TransientExhausted {
        /// HTTP status code of the last response.
        status: u16,
        /// Response body of the last response, redacted.
        body: String,
        /// Attempts made when this status was observed.
        attempts: u32,
    },

    /// The request never produced a response because of a connectivity
    /// problem (refused, reset, aborted, timed out).
    #[error("Network error after {attempts} attempt(s): {message}")]
    Network {
        /// Transport error description, redacted.
        message: String,
        /// Attempts made when this failure was observed.
        attempts: u32,
    },

    /// The transport failed in a way that is not recognised as a connectivity
    /// problem. Not retried.
    #[error("Unexpected transport failure: {message}")]
    Unexpected {
        /// Transport error description, redacted.
        message: String,
    },

    /// The gateway answered with a success status but the body is not JSON.
    #[error("Gateway response could not be decoded: {message}")]
    Decode {
        /// Decoder error description, redacted.
        message: String,
    },

    /// The attempt loop finished without recording any error.
    #[error("Gateway retries exhausted")]
    RetriesExhausted,
}

impl GatewayError {
    /// Returns the retry policy for this error.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            GatewayError::TransientExhausted { .. } | GatewayError::Network { .. } => {
                RetryPolicy::Retryable
            }
            GatewayError::Fatal { .. }
            | GatewayError::Unexpected { .. }
            | GatewayError::Decode { .. }
            | GatewayError::RetriesExhausted => RetryPolicy::NonRetryable,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Fatal { status, .. } | GatewayError::TransientExhausted { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Errors that abort a pipeline run or a capabilities query.
///
/// There is no partial result: the first failing step ends the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A step's gateway call failed.
    #[error("{step} step failed: {source}")]
    Gateway {
        /// The step whose call failed.
        step: StepName,
        /// The underlying gateway failure.
        #[source]
        source: GatewayError,
    },

    /// A step's response did not have the expected shape.
    #[error("{step} response failed validation: {message}")]
    Validation {
        /// The step whose response was rejected.
        step: StepName,
        /// Description of the shape mismatch.
        message: String,
    },

    /// The capabilities query failed at the gateway.
    #[error("capabilities query failed: {source}")]
    Capabilities {
        /// The underlying gateway failure.
        #[source]
        source: GatewayError,
    },

    /// The capabilities response did not have the expected shape.
    #[error("capabilities response failed validation: {message}")]
    CapabilitiesValidation {
        /// Description of the shape mismatch.
        message: String,
    },

    /// Options or runtime configuration are invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}
