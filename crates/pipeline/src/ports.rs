//! Port traits implemented by infrastructure crates.
//!
//! The orchestration layer depends only on these traits, so tests can drive the
//! full step sequence against an in-memory gateway.

use async_trait::async_trait;
use serde_json::Value;

use crate::GatewayError;

/// A credential-bound client for the single remote gateway endpoint.
///
/// `path` and `method` are logical routing metadata carried inside the request
/// envelope; they are opaque to the transport. Implementations own retry,
/// timeout, and redaction: by the time an error reaches the caller it is final
/// and free of the credential.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Sends `payload` to the logical route `path` and returns the decoded
    /// response body, without unwrapping or validation.
    async fn call(&self, path: &str, method: &str, payload: &Value) -> Result<Value, GatewayError>;
}
