//! Core domain for the Cournot resolver client.
//!
//! This crate contains every domain concept, newtype identifier, step shape,
//! report type, and error type used by the resolver. The gateway adapter
//! implements the [`Gateway`] trait defined here; the step sequencer drives it.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`PipelineRunId`, `MarketId`, `RuleId`, `CollectorName`) |
//! | [`types`] | Value types (`StepName`, `PipelineOptions`, `Outcome`, `Confidence`, `Timestamp`) |
//! | [`errors`] | Gateway and pipeline errors, retry policy |
//! | [`ports`] | The [`Gateway`] port trait |
//! | [`shapes`] | Step request payloads, response shapes, `{data}` unwrapping, validation |
//! | [`lookup`] | Ordered fallback field lookup for loosely-typed payloads |
//! | [`report`] | The resolution report and its markdown rendering |

pub mod errors;
pub mod identifiers;
pub mod lookup;
pub mod ports;
pub mod report;
pub mod shapes;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{GatewayError, PipelineError, RetryPolicy};
pub use identifiers::{CollectorName, MarketId, PipelineRunId, RuleId};
pub use ports::Gateway;
pub use report::{MarkdownReport, Report, StepTiming};
pub use shapes::{
    audit_request, bundle_request, collect_request, judge_request, prompt_request, unwrap_data,
    validate_step, AuditResult, BundleResult, Capabilities, CollectResult, JudgeResult,
    PromptResult, RunResults, StepResponse,
};
pub use types::{Confidence, Outcome, PipelineOptions, StepName, Timestamp, DEFAULT_COLLECTOR};
