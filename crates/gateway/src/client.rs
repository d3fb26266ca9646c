//! The resilient gateway call primitive.
//!
//! One logical call = up to [`GatewayConfig::max_attempts`] transport attempts.
//! Each attempt is bounded by [`GatewayConfig::timeout`]; attempts after the
//! first are preceded by [`GatewayConfig::backoff_delay`]. Outcomes are
//! classified as:
//!
//! | Outcome | Classification |
//! |---------|----------------|
//! | 2xx | decoded and returned |
//! | 5xx, 429, 408 | transient: retried, surfaced when attempts run out |
//! | any other status | fatal: surfaced immediately |
//! | connectivity failure or timeout | network: retried, surfaced when attempts run out |
//! | other transport failure | unexpected: surfaced immediately |
//!
//! Every message that leaves this module, as an error or a log event, has
//! been passed through the client's [`Redactor`].

use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{Gateway, GatewayError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::GatewayConfig;
use crate::credential::{Credential, Redactor};
use crate::envelope::Envelope;
use crate::transport::{ReqwestTransport, Sleeper, TokioSleeper, Transport, TransportResponse};

/// Failure to construct a [`GatewayClient`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The HTTP client could not be initialised.
    #[error("failed to initialise HTTP transport: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Returns `true` for statuses that are worth retrying.
pub fn is_transient_status(status: u16) -> bool {
    status >= 500 || status == 429 || status == 408
}

/// Credential-bound gateway client.
///
/// Cheap to clone; each pipeline run normally owns its own instance.
#[derive(Clone)]
pub struct GatewayClient {
    credential: Credential,
    redactor: Redactor,
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("credential", &self.credential)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Creates a client using the `reqwest` transport and the tokio timer.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(credential: Credential, config: GatewayConfig) -> Result<Self, ClientBuildError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_parts(
            credential,
            config,
            Arc::new(transport),
            Arc::new(TokioSleeper),
        ))
    }

    /// Creates a client from explicit transport and sleeper implementations.
    pub fn with_parts(
        credential: Credential,
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let redactor = Redactor::new(&credential);
        Self {
            credential,
            redactor,
            config,
            transport,
            sleeper,
        }
    }

    /// Sends one logical request, retrying transient and network failures.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Fatal`] on a non-retryable status (first occurrence).
    /// - [`GatewayError::TransientExhausted`] when every attempt saw 5xx/429/408.
    /// - [`GatewayError::Network`] when the last attempt failed to connect or
    ///   timed out.
    /// - [`GatewayError::Unexpected`] on an unrecognised transport failure.
    /// - [`GatewayError::Decode`] when a 2xx body is not JSON.
    #[instrument(name = "gateway.call", skip_all, fields(path = %path, method = %method))]
    pub async fn send(&self, path: &str, method: &str, payload: &Value) -> Result<Value, GatewayError> {
        let body = Envelope::new(&self.credential, path, method, payload)
            .and_then(|envelope| envelope.to_body())
            .map_err(|e| GatewayError::Unexpected {
                message: self.redactor.redact_owned(&e.to_string()),
            })?;

        let mut last_error: Option<GatewayError> = None;
        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                let delay = self.config.backoff_delay(attempt);
                debug!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "backing off before retry"
                );
                self.sleeper.sleep(delay).await;
            }

            match self.attempt(&body, attempt + 1).await {
                Ok(value) => {
                    debug!(attempts = attempt + 1, "gateway call succeeded");
                    return Ok(value);
                }
                Err(err) if err.retry_policy().is_retryable() => {
                    if attempt + 1 < self.config.max_attempts {
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.config.max_attempts,
                            error = %err,
                            "gateway attempt failed, retrying"
                        );
                    }
                    last_error = Some(err);
                }
                Err(err) => {
                    debug!(error = %err, "gateway call failed without retry");
                    return Err(err);
                }
            }
        }

        // The caller reports the final failure.
        let err = last_error.unwrap_or(GatewayError::RetriesExhausted);
        debug!(error = %err, "gateway retries exhausted");
        Err(err)
    }

    /// Performs one transport attempt and classifies its outcome.
    ///
    /// `attempts` is the 1-based count including this attempt.
    async fn attempt(&self, body: &str, attempts: u32) -> Result<Value, GatewayError> {
        let outcome = tokio::time::timeout(
            self.config.timeout,
            self.transport.post(&self.config.url, body),
        )
        .await;

        let response = match outcome {
            Err(_elapsed) => {
                return Err(GatewayError::Network {
                    message: format!(
                        "request aborted: timed out after {} ms",
                        self.config.timeout.as_millis()
                    ),
                    attempts,
                });
            }
            Ok(Err(transport_err)) => {
                let message = self.redactor.redact_owned(transport_err.message());
                return Err(if transport_err.is_network() {
                    GatewayError::Network { message, attempts }
                } else {
                    GatewayError::Unexpected { message }
                });
            }
            Ok(Ok(response)) => response,
        };

        self.classify(response, attempts)
    }

    fn classify(&self, response: TransportResponse, attempts: u32) -> Result<Value, GatewayError> {
        if response.is_success() {
            return serde_json::from_str(&response.body).map_err(|e| GatewayError::Decode {
                message: self.redactor.redact_owned(&e.to_string()),
            });
        }

        let status = response.status;
        let body = self.redactor.redact_owned(&response.body);
        if is_transient_status(status) {
            Err(GatewayError::TransientExhausted {
                status,
                body,
                attempts,
            })
        } else {
            Err(GatewayError::Fatal { status, body })
        }
    }
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn call(&self, path: &str, method: &str, payload: &Value) -> Result<Value, GatewayError> {
        self.send(path, method, payload).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::transport::{TransportError, TransportErrorKind};

    const CODE: &str = "c0de.*+?";

    enum Step {
        Status(u16, &'static str),
        Fail(TransportErrorKind, String),
        Hang,
    }

    /// Transport that replays a fixed script and records every request body.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Step>>,
        requests: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedTransport {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(steps.into()),
                requests: Mutex::default(),
            })
        }

        fn attempts(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post(&self, url: &str, body: &str) -> Result<TransportResponse, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), body.to_string()));
            let step = self.script.lock().unwrap().pop_front().expect("script exhausted");
            match step {
                Step::Status(status, body) => Ok(TransportResponse {
                    status,
                    body: body.to_string(),
                }),
                Step::Fail(kind, message) => Err(TransportError::new(kind, message)),
                Step::Hang => std::future::pending().await,
            }
        }
    }

    /// Sleeper that returns immediately and records requested delays.
    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    fn client(transport: Arc<ScriptedTransport>, sleeper: Arc<RecordingSleeper>) -> GatewayClient {
        GatewayClient::with_parts(
            Credential::new(CODE),
            GatewayConfig::default().with_timeout(Duration::from_millis(50)),
            transport,
            sleeper,
        )
    }

    async fn run(steps: Vec<Step>) -> (Result<Value, GatewayError>, Arc<ScriptedTransport>, Arc<RecordingSleeper>) {
        let transport = ScriptedTransport::new(steps);
        let sleeper = Arc::new(RecordingSleeper::default());
        let result = client(transport.clone(), sleeper.clone())
            .call("/step/prompt", "POST", &json!({"user_input": "q"}))
            .await;
        (result, transport, sleeper)
    }

    #[tokio::test]
    async fn retries_transient_statuses_until_success() {
        let (result, transport, sleeper) = run(vec![
            Step::Status(500, "busy"),
            Step::Status(500, "busy"),
            Step::Status(200, r#"{"data": {"ok": true}}"#),
        ])
        .await;

        assert_eq!(result.unwrap(), json!({"data": {"ok": true}}));
        assert_eq!(transport.attempts(), 3);
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn non_transient_status_fails_on_first_attempt() {
        let (result, transport, sleeper) = run(vec![Step::Status(400, "bad request")]).await;

        assert_eq!(
            result.unwrap_err(),
            GatewayError::Fatal {
                status: 400,
                body: "bad request".into()
            }
        );
        assert_eq!(transport.attempts(), 1);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn three_transient_statuses_exhaust_retries() {
        let (result, transport, _) = run(vec![
            Step::Status(503, "one"),
            Step::Status(429, "two"),
            Step::Status(500, "three"),
        ])
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(matches!(err, GatewayError::TransientExhausted { attempts: 3, .. }));
        assert!(err.to_string().contains("500"));
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn request_timeout_status_is_transient() {
        let (result, transport, _) =
            run(vec![Step::Status(408, "slow"), Step::Status(200, "{}")]).await;
        assert_eq!(result.unwrap(), json!({}));
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test]
    async fn single_network_failure_is_retried() {
        let (result, transport, sleeper) = run(vec![
            Step::Fail(TransportErrorKind::Connect, "connection refused".into()),
            Step::Status(200, r#"{"ok": 1}"#),
        ])
        .await;

        assert_eq!(result.unwrap(), json!({"ok": 1}));
        assert_eq!(transport.attempts(), 2);
        assert_eq!(*sleeper.delays.lock().unwrap(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn persistent_network_failure_surfaces_redacted_message() {
        let message = format!("socket closed while sending code={CODE}");
        let (result, transport, _) = run(vec![
            Step::Fail(TransportErrorKind::Other, message.clone()),
            Step::Fail(TransportErrorKind::Other, message.clone()),
            Step::Fail(TransportErrorKind::Other, message),
        ])
        .await;

        let err = result.unwrap_err();
        assert_eq!(transport.attempts(), 3);
        assert!(matches!(err, GatewayError::Network { attempts: 3, .. }));
        let text = err.to_string();
        assert!(!text.contains(CODE), "{text}");
        assert!(text.contains("code=[REDACTED]"), "{text}");
    }

    #[tokio::test]
    async fn unrecognised_transport_failure_is_not_retried() {
        let (result, transport, _) = run(vec![Step::Fail(
            TransportErrorKind::Other,
            "builder error: relative URL without a base".into(),
        )])
        .await;

        assert!(matches!(result, Err(GatewayError::Unexpected { .. })));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn hung_attempts_are_aborted_by_the_timeout() {
        let (result, transport, _) =
            run(vec![Step::Hang, Step::Status(200, r#"{"late": true}"#)]).await;

        assert_eq!(result.unwrap(), json!({"late": true}));
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test]
    async fn error_bodies_are_redacted() {
        let body: &'static str = "invalid code c0de.*+? (expected c0de.*+? to be active)";
        let (result, _, _) = run(vec![Step::Status(401, body)]).await;

        match result.unwrap_err() {
            GatewayError::Fatal { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid code [REDACTED] (expected [REDACTED] to be active)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_success_body_is_a_decode_error() {
        let (result, transport, _) = run(vec![Step::Status(200, "<html>")]).await;
        assert!(matches!(result, Err(GatewayError::Decode { .. })));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn every_attempt_posts_the_same_envelope_to_the_configured_url() {
        let (_, transport, _) =
            run(vec![Step::Status(502, ""), Step::Status(200, "{}")]).await;

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
        assert_eq!(requests[0].0, crate::DEFAULT_GATEWAY_URL);

        let envelope: Value = serde_json::from_str(&requests[0].1).unwrap();
        assert_eq!(envelope["code"], CODE);
        assert_eq!(envelope["path"], "/step/prompt");
        assert_eq!(envelope["method"], "POST");
        assert_eq!(envelope["post_data"], r#"{"user_input":"q"}"#);
    }

    #[tokio::test]
    async fn zero_attempt_budget_reports_exhaustion() {
        let transport = ScriptedTransport::new(Vec::new());
        let mut config = GatewayConfig::default();
        config.max_attempts = 0;
        let client = GatewayClient::with_parts(
            Credential::new(CODE),
            config,
            transport.clone(),
            Arc::new(RecordingSleeper::default()),
        );

        let err = client.call("/capabilities", "GET", &json!({})).await.unwrap_err();
        assert_eq!(err, GatewayError::RetriesExhausted);
        assert_eq!(transport.attempts(), 0);
    }

    /// Log sink shared between a test subscriber and the assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn only_retried_attempts_are_logged_above_debug() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (result, _, _) = run(vec![
            Step::Status(503, "one"),
            Step::Status(503, "two"),
            Step::Status(503, "three"),
        ])
        .await;
        assert!(result.is_err());
        let (result, _, _) = run(vec![Step::Status(404, "missing")]).await;
        assert!(result.is_err());

        let text = logs.text();
        assert_eq!(text.matches("WARN").count(), 2, "{text}");
        assert!(!text.contains("ERROR"), "{text}");
        assert!(!text.contains("missing"), "{text}");
    }

    #[test]
    fn transient_status_set() {
        for status in [408, 429, 500, 502, 503, 504, 599] {
            assert!(is_transient_status(status), "{status}");
        }
        for status in [400, 401, 403, 404, 409, 422] {
            assert!(!is_transient_status(status), "{status}");
        }
    }
}
