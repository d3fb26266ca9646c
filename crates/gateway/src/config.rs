//! Gateway configuration: the fixed endpoint, attempt budget, timeout, and
//! back-off schedule.
//!
//! Values are injected into [`crate::GatewayClient`] at construction; nothing
//! here is global, so tests can shrink the timeout or point the client at a
//! local mock server.

use std::time::Duration;

/// The single gateway endpoint every call is POSTed to.
pub const DEFAULT_GATEWAY_URL: &str = "https://interface.cournot.ai/play/polymarket/ai_data";

/// Environment variable that overrides [`DEFAULT_GATEWAY_URL`] in the CLI.
pub const GATEWAY_URL_ENV: &str = "COURNOT_GATEWAY_URL";

/// Attempts per logical call, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

/// Hard per-attempt timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(300_000);

/// Delay before the first retry; doubles for each later retry.
pub const BACKOFF_BASE: Duration = Duration::from_millis(1_000);

/// Upper bound on any single back-off delay.
pub const BACKOFF_CAP: Duration = Duration::from_millis(10_000);

/// Runtime configuration of a [`crate::GatewayClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Endpoint URL.
    pub url: String,
    /// Attempts per logical call. Zero makes every call fail without I/O.
    pub max_attempts: u32,
    /// Hard timeout applied to each attempt.
    pub timeout: Duration,
    /// Back-off before attempt index 1.
    pub backoff_base: Duration,
    /// Back-off ceiling.
    pub backoff_cap: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GATEWAY_URL.to_string(),
            max_attempts: MAX_ATTEMPTS,
            timeout: REQUEST_TIMEOUT,
            backoff_base: BACKOFF_BASE,
            backoff_cap: BACKOFF_CAP,
        }
    }
}

impl GatewayConfig {
    /// Replaces the endpoint URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Replaces the per-attempt timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay to wait before attempt index `attempt` (0-based).
    ///
    /// Formula: `min(backoff_base * 2^(attempt - 1), backoff_cap)`, so with the
    /// defaults attempt 1 waits 1 s and attempt 2 waits 2 s. Attempt 0 is never
    /// delayed by the client.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor).min(self.backoff_cap)
    }
}
