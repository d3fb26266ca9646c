//! The capabilities query: which collectors and providers the gateway offers.

use pipeline::{Capabilities, Gateway, PipelineError};
use serde_json::json;

/// Logical route of the capabilities query.
pub const CAPABILITIES_PATH: &str = "/capabilities";

/// Logical method of the capabilities query. The transport still POSTs.
pub const CAPABILITIES_METHOD: &str = "GET";

/// Queries the gateway for its collectors and providers.
///
/// # Errors
///
/// [`PipelineError::Capabilities`] if the call fails,
/// [`PipelineError::CapabilitiesValidation`] if the response has the wrong
/// shape.
pub async fn capabilities<G: Gateway + ?Sized>(gateway: &G) -> Result<Capabilities, PipelineError> {
    let body = gateway
        .call(CAPABILITIES_PATH, CAPABILITIES_METHOD, &json!({}))
        .await
        .map_err(|source| PipelineError::Capabilities { source })?;
    let caps = Capabilities::from_response(body)?;
    tracing::info!(
        collectors = caps.collectors.len(),
        providers = caps.providers.len(),
        "capabilities fetched"
    );
    Ok(caps)
}
