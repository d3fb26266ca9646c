//! Shared value types for the resolver domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. confidence is in `[0.0, 1.0]`) or
//! describe the fixed shape of a run (the five [`StepName`]s, the per-run
//! [`PipelineOptions`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CollectorName;

/// Collector used when the caller does not name any.
pub const DEFAULT_COLLECTOR: &str = "CollectorGeminiGrounded";

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One of the five sequential pipeline stages.
///
/// The order of [`StepName::ALL`] is the execution order; each step consumes
/// outputs of the steps before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    /// Turns the user query into a prompt spec and tool plan.
    Prompt,
    /// Gathers evidence bundles using the selected collectors.
    Collect,
    /// Produces a reasoning trace over the evidence.
    Audit,
    /// Produces the verdict, outcome, and confidence.
    Judge,
    /// Commits the run to cryptographic roots.
    Bundle,
}

impl StepName {
    /// All steps in execution order.
    pub const ALL: [StepName; 5] = [
        StepName::Prompt,
        StepName::Collect,
        StepName::Audit,
        StepName::Judge,
        StepName::Bundle,
    ];

    /// Returns the lowercase step name.
    pub fn as_str(self) -> &'static str {
        match self {
            StepName::Prompt => "prompt",
            StepName::Collect => "collect",
            StepName::Audit => "audit",
            StepName::Judge => "judge",
            StepName::Bundle => "bundle",
        }
    }

    /// Returns the logical gateway route for this step.
    pub fn route(self) -> &'static str {
        match self {
            StepName::Prompt => "/step/prompt",
            StepName::Collect => "/step/collect",
            StepName::Audit => "/step/audit",
            StepName::Judge => "/step/judge",
            StepName::Bundle => "/step/bundle",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Run options
// ---------------------------------------------------------------------------

/// Caller-supplied options for one pipeline run.
///
/// The credential is deliberately absent: it is bound to the gateway client at
/// construction and never travels through the domain layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Natural-language question to resolve.
    pub query: String,
    /// Ask the prompt step for strict interpretation of the query.
    pub strict_mode: bool,
    /// Collectors the collect step should use, in priority order.
    pub collectors: Vec<CollectorName>,
    /// Ask collectors to return raw page content alongside summaries.
    pub include_raw_content: bool,
}

impl PipelineOptions {
    /// Creates options for `query` with the default settings: non-strict,
    /// [`DEFAULT_COLLECTOR`] only, no raw content.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            strict_mode: false,
            collectors: default_collectors(),
            include_raw_content: false,
        }
    }

    /// Sets strict mode.
    #[must_use]
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Replaces the collector list. An empty list restores the default.
    #[must_use]
    pub fn with_collectors(mut self, collectors: Vec<CollectorName>) -> Self {
        self.collectors = if collectors.is_empty() {
            default_collectors()
        } else {
            collectors
        };
        self
    }

    /// Sets whether raw collector content is requested.
    #[must_use]
    pub fn with_raw_content(mut self, include: bool) -> Self {
        self.include_raw_content = include;
        self
    }
}

fn default_collectors() -> Vec<CollectorName> {
    CollectorName::new(DEFAULT_COLLECTOR).into_iter().collect()
}

// ---------------------------------------------------------------------------
// Verdict values
// ---------------------------------------------------------------------------

/// The resolved outcome of a market (e.g. `"YES"`, `"NO"`, `"INVALID"`).
///
/// The set of outcomes is owned by the gateway; the client only requires the
/// value to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Outcome(String);

impl Outcome {
    /// Creates an [`Outcome`], returning `None` if the string is empty or
    /// whitespace.
    pub fn new(outcome: impl Into<String>) -> Option<Self> {
        let o = outcome.into();
        if o.trim().is_empty() {
            None
        } else {
            Some(Self(o))
        }
    }

    /// Returns the outcome as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Outcome {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "outcome must not be empty".to_string())
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------

/// The judge's confidence in its outcome, in the range `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Creates a [`Confidence`], returning `None` if `value` is outside
    /// the valid range `[0.0, 1.0]`.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the confidence as an `f64` in `[0.0, 1.0]`.
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("confidence {value} is outside [0.0, 1.0]"))
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
