//! The wire-level request wrapper sent to the gateway endpoint.
//!
//! Wire shape: `{"code", "post_data", "path", "method"}` where `post_data` is
//! the step payload serialised to a JSON *string* (the envelope itself is then
//! serialised again for transport). `method` is a logical verb read by the
//! gateway; the transport call is always POST.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::credential::{Credential, REDACTION_MARKER};

/// One request envelope, borrowing the credential and route from the caller.
#[derive(Serialize)]
pub struct Envelope<'a> {
    code: &'a str,
    post_data: String,
    path: &'a str,
    method: &'a str,
}

impl<'a> Envelope<'a> {
    /// Builds an envelope, serialising `payload` into `post_data`.
    ///
    /// # Errors
    ///
    /// Returns the serialiser error if `payload` cannot be encoded.
    pub fn new(
        credential: &'a Credential,
        path: &'a str,
        method: &'a str,
        payload: &Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            code: credential.expose(),
            post_data: serde_json::to_string(payload)?,
            path,
            method,
        })
    }

    /// Serialises the envelope into the HTTP request body.
    ///
    /// # Errors
    ///
    /// Returns the serialiser error if encoding fails.
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Debug for Envelope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("code", &REDACTION_MARKER)
            .field("post_data", &self.post_data)
            .field("path", &self.path)
            .field("method", &self.method)
            .finish()
    }
}
