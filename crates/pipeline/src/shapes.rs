//! Request payloads and validated response shapes for the five steps.
//!
//! The gateway may wrap a result as `{"data": <result>}`; [`unwrap_data`]
//! removes that single level before a response is checked against its
//! [`StepResponse`] shape. Validation is structural only: unknown fields are
//! ignored and payload contents are never interpreted beyond the fields the
//! next step or the report needs.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::lookup::first_str_in;
use crate::{
    CollectorName, Confidence, MarketId, Outcome, PipelineError, PipelineOptions, StepName,
};

/// Keys tried, in order, for the market id inside a prompt spec.
const MARKET_ID_KEYS: &[&str] = &["market_id", "marketId", "id"];

// ---------------------------------------------------------------------------
// Envelope unwrapping and validation
// ---------------------------------------------------------------------------

/// Removes one level of `{"data": ...}` wrapping.
///
/// If `body` is an object with a `data` field, that field's value is returned;
/// otherwise `body` is returned unchanged.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// A typed step response with a fixed expected shape.
pub trait StepResponse: DeserializeOwned {
    /// The step that produces this response.
    const STEP: StepName;

    /// Checks invariants serde cannot express. Returns a description of the
    /// first violation.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Unwraps and validates a decoded step response.
///
/// # Errors
///
/// Returns [`PipelineError::Validation`] naming `T::STEP` when the (unwrapped)
/// body is not an object, lacks a required field, has a field of the wrong
/// type, or violates [`StepResponse::check`].
pub fn validate_step<T: StepResponse>(body: Value) -> Result<T, PipelineError> {
    let invalid = |message: String| PipelineError::Validation {
        step: T::STEP,
        message,
    };
    let parsed: T = parse_object(unwrap_data(body)).map_err(invalid)?;
    parsed.check().map_err(invalid)?;
    tracing::debug!(step = %T::STEP, "response shape validated");
    Ok(parsed)
}

/// Deserialises `body` into `T`, insisting on a JSON object first.
///
/// serde's derived struct visitors also accept arrays; a positional array is
/// never a valid gateway result.
fn parse_object<T: DeserializeOwned>(body: Value) -> Result<T, String> {
    if !body.is_object() {
        return Err(format!("expected a JSON object, got {}", kind_of(&body)));
    }
    serde_json::from_value(body).map_err(|e| e.to_string())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Step responses
// ---------------------------------------------------------------------------

/// Output of the prompt step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResult {
    /// Structured interpretation of the query; forwarded to every later step.
    pub prompt_spec: Map<String, Value>,
    /// Collector tool plan; forwarded to the collect step.
    #[serde(default)]
    pub tool_plan: Value,
    /// Top-level market id as sent by the gateway. Report-only, so any shape
    /// is accepted here; see [`PromptResult::market_id`].
    #[serde(default, skip_serializing_if = "Value::is_null")]
    market_id: Value,
}

impl PromptResult {
    /// Returns the market id, falling back to well-known keys inside the
    /// prompt spec when the response does not carry one at the top level.
    ///
    /// Only non-blank strings count as ids, at either level.
    pub fn market_id(&self) -> Option<MarketId> {
        let top = self
            .market_id
            .as_str()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        top.or_else(|| first_str_in(&self.prompt_spec, MARKET_ID_KEYS))
            .and_then(|id| MarketId::new(id))
    }
}


impl StepResponse for PromptResult {
    const STEP: StepName = StepName::Prompt;
}

/// Output of the collect step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectResult {
    /// Evidence gathered by the collectors, opaque to the client.
    pub evidence_bundles: Vec<Value>,
    /// Collectors that actually contributed evidence. Blank and non-string
    /// entries are dropped.
    #[serde(default, deserialize_with = "lenient_collectors")]
    pub collectors_used: Vec<CollectorName>,
}

fn lenient_collectors<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<CollectorName>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(raw
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|name| CollectorName::new(name.trim()))
                .collect()
        })
        .unwrap_or_default())
}

impl StepResponse for CollectResult {
    const STEP: StepName = StepName::Collect;
}

/// Output of the audit step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    /// Reasoning over the evidence, opaque to the client.
    pub reasoning_trace: Map<String, Value>,
}

impl StepResponse for AuditResult {
    const STEP: StepName = StepName::Audit;
}

/// Output of the judge step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResult {
    /// Full verdict document; forwarded to the bundle step.
    pub verdict: Map<String, Value>,
    /// Resolved outcome.
    pub outcome: Outcome,
    /// Confidence in `outcome`.
    pub confidence: Confidence,
}

impl StepResponse for JudgeResult {
    const STEP: StepName = StepName::Judge;
}

/// Output of the bundle step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleResult {
    /// Named hash commitments over the run. Computed remotely; opaque here.
    pub roots: BTreeMap<String, String>,
    /// The bundle document the roots commit to.
    #[serde(default)]
    pub bundle: Value,
}

impl StepResponse for BundleResult {
    const STEP: StepName = StepName::Bundle;

    fn check(&self) -> Result<(), String> {
        if self.roots.is_empty() {
            return Err("roots must contain at least one hash".to_string());
        }
        match self.roots.iter().find(|(_, hash)| hash.trim().is_empty()) {
            Some((name, _)) => Err(format!("root `{name}` is empty")),
            None => Ok(()),
        }
    }
}

/// All five step results of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResults {
    /// Prompt step output.
    pub prompt: PromptResult,
    /// Collect step output.
    pub collect: CollectResult,
    /// Audit step output.
    pub audit: AuditResult,
    /// Judge step output.
    pub judge: JudgeResult,
    /// Bundle step output.
    pub bundle: BundleResult,
}

// ---------------------------------------------------------------------------
// Step requests
// ---------------------------------------------------------------------------

/// Builds the prompt step payload.
pub fn prompt_request(options: &PipelineOptions) -> Value {
    json!({
        "user_input": options.query,
        "strict_mode": options.strict_mode,
    })
}

/// Builds the collect step payload.
pub fn collect_request(options: &PipelineOptions, prompt: &PromptResult) -> Value {
    json!({
        "prompt_spec": prompt.prompt_spec,
        "tool_plan": prompt.tool_plan,
        "collectors": options.collectors,
        "include_raw_content": options.include_raw_content,
    })
}

/// Builds the audit step payload.
pub fn audit_request(prompt: &PromptResult, collect: &CollectResult) -> Value {
    json!({
        "prompt_spec": prompt.prompt_spec,
        "evidence_bundles": collect.evidence_bundles,
    })
}

/// Builds the judge step payload.
pub fn judge_request(prompt: &PromptResult, collect: &CollectResult, audit: &AuditResult) -> Value {
    json!({
        "prompt_spec": prompt.prompt_spec,
        "evidence_bundles": collect.evidence_bundles,
        "reasoning_trace": audit.reasoning_trace,
    })
}

/// Builds the bundle step payload.
pub fn bundle_request(
    prompt: &PromptResult,
    collect: &CollectResult,
    audit: &AuditResult,
    judge: &JudgeResult,
) -> Value {
    json!({
        "prompt_spec": prompt.prompt_spec,
        "evidence_bundles": collect.evidence_bundles,
        "reasoning_trace": audit.reasoning_trace,
        "verdict": judge.verdict,
    })
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Collectors and providers the gateway currently offers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Collector descriptors (strings or objects).
    #[serde(default)]
    pub collectors: Vec<Value>,
    /// Provider descriptors (strings or objects).
    #[serde(default)]
    pub providers: Vec<Value>,
}

impl Capabilities {
    /// Unwraps and validates a decoded capabilities response.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::CapabilitiesValidation`] when the unwrapped body
    /// is not an object or its lists are not arrays.
    pub fn from_response(body: Value) -> Result<Self, PipelineError> {
        parse_object(unwrap_data(body))
            .map_err(|message| PipelineError::CapabilitiesValidation { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_wrapper_is_removed_once() {
        let wrapped = json!({"data": {"data": 1}});
        assert_eq!(unwrap_data(wrapped), json!({"data": 1}));
        assert_eq!(unwrap_data(json!({"x": 1})), json!({"x": 1}));
        assert_eq!(unwrap_data(json!([1])), json!([1]));
    }

    #[test]
    fn wrapped_and_unwrapped_bodies_validate_identically() {
        let body = json!({"reasoning_trace": {"summary": "ok"}});
        let direct: AuditResult = validate_step(body.clone()).unwrap();
        let wrapped: AuditResult = validate_step(json!({"data": body})).unwrap();
        assert_eq!(direct, wrapped);
    }

    #[test]
    fn missing_required_field_names_the_step() {
        let err = validate_step::<JudgeResult>(json!({"verdict": {}, "outcome": "YES"}))
            .unwrap_err();
        match err {
            PipelineError::Validation { step, message } => {
                assert_eq!(step, StepName::Judge);
                assert!(message.contains("confidence"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn arrays_are_rejected_even_when_positionally_valid() {
        let err = validate_step::<AuditResult>(json!([{"summary": "x"}])).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object, got an array"));
    }

    #[test]
    fn out_of_range_confidence_is_a_validation_error() {
        let body = json!({"verdict": {}, "outcome": "NO", "confidence": 1.2});
        assert!(matches!(
            validate_step::<JudgeResult>(body),
            Err(PipelineError::Validation { step: StepName::Judge, .. })
        ));
    }

    #[test]
    fn bundle_roots_must_be_non_empty_strings() {
        assert!(validate_step::<BundleResult>(json!({"roots": {}})).is_err());
        assert!(validate_step::<BundleResult>(json!({"roots": {"a": ""}})).is_err());
        assert!(validate_step::<BundleResult>(json!({"roots": {"a": 1}})).is_err());
        let ok: BundleResult = validate_step(json!({"roots": {"a": "0xabc"}})).unwrap();
        assert_eq!(ok.bundle, Value::Null);
    }

    #[test]
    fn market_id_falls_back_to_prompt_spec() {
        let top: PromptResult =
            validate_step(json!({"prompt_spec": {"marketId": "m-2"}, "market_id": "m-1"})).unwrap();
        assert_eq!(top.market_id().unwrap().as_str(), "m-1");

        let nested: PromptResult =
            validate_step(json!({"prompt_spec": {"marketId": "m-2"}})).unwrap();
        assert_eq!(nested.market_id().unwrap().as_str(), "m-2");

        let none: PromptResult = validate_step(json!({"prompt_spec": {}})).unwrap();
        assert!(none.market_id().is_none());
    }

    #[test]
    fn odd_market_ids_are_ignored_rather_than_fatal() {
        let numeric: PromptResult =
            validate_step(json!({"prompt_spec": {"q": 1}, "market_id": 12345})).unwrap();
        assert!(numeric.market_id().is_none());

        let empty: PromptResult =
            validate_step(json!({"prompt_spec": {"market_id": "m-3"}, "market_id": ""})).unwrap();
        assert_eq!(empty.market_id().unwrap().as_str(), "m-3");

        let nested_numeric: PromptResult =
            validate_step(json!({"prompt_spec": {"market_id": 12345, "id": "m-4"}})).unwrap();
        assert_eq!(nested_numeric.market_id().unwrap().as_str(), "m-4");
    }

    #[test]
    fn blank_and_non_string_collectors_are_dropped() {
        let collect: CollectResult = validate_step(json!({
            "evidence_bundles": [],
            "collectors_used": ["A", "", "  ", 7, null, "B"]
        }))
        .unwrap();
        let names: Vec<&str> = collect.collectors_used.iter().map(CollectorName::as_str).collect();
        assert_eq!(names, ["A", "B"]);

        let null: CollectResult =
            validate_step(json!({"evidence_bundles": [], "collectors_used": null})).unwrap();
        assert!(null.collectors_used.is_empty());
    }

    #[test]
    fn collect_request_threads_prompt_outputs_and_options() {
        let prompt: PromptResult =
            validate_step(json!({"prompt_spec": {"q": 1}, "tool_plan": ["search"]})).unwrap();
        let opts = PipelineOptions::new("q").with_raw_content(true);
        let payload = collect_request(&opts, &prompt);
        assert_eq!(payload["prompt_spec"], json!({"q": 1}));
        assert_eq!(payload["tool_plan"], json!(["search"]));
        assert_eq!(payload["collectors"], json!(["CollectorGeminiGrounded"]));
        assert_eq!(payload["include_raw_content"], json!(true));
    }

    #[test]
    fn capabilities_lists_default_to_empty() {
        let caps = Capabilities::from_response(json!({"data": {"collectors": ["A"]}})).unwrap();
        assert_eq!(caps.collectors, vec![json!("A")]);
        assert!(caps.providers.is_empty());
        assert!(Capabilities::from_response(json!("nope")).is_err());
    }
}
