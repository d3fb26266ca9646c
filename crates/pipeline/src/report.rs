//! The resolution report assembled from a completed run.
//!
//! [`Report`] is the machine-readable form (serialised as JSON by the CLI);
//! [`Report::to_markdown`] renders the human-readable form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lookup::first_str;
use crate::{
    CollectorName, Confidence, MarketId, Outcome, PipelineOptions, PipelineRunId, RuleId,
    RunResults, StepName, Timestamp,
};

/// Keys tried, in order, for the applied rule id in the verdict and then the
/// reasoning trace.
const RULE_ID_KEYS: &[&str] = &["rule_id", "ruleId", "applied_rule", "rule"];

/// Keys tried, in order, for a one-line summary of an evidence bundle.
const HIGHLIGHT_KEYS: &[&str] = &["summary", "title", "claim", "content", "text"];

/// Keys tried, in order, for the summary of a reasoning trace.
const REASONING_SUMMARY_KEYS: &[&str] = &["summary", "conclusion", "rationale", "explanation"];

/// Maximum number of evidence highlights carried by a report.
pub const MAX_HIGHLIGHTS: usize = 5;

/// Highlights longer than this many characters are truncated.
pub const MAX_HIGHLIGHT_CHARS: usize = 200;

/// Wall-clock duration of one step, including retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTiming {
    /// The step measured.
    pub step: StepName,
    /// Elapsed milliseconds from request construction to validated result.
    pub duration_ms: u64,
}

/// Final output of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Run that produced this report.
    pub run_id: PipelineRunId,
    /// When the report was assembled.
    pub generated_at: Timestamp,
    /// The question as supplied by the caller.
    pub query: String,
    /// Market the prompt step resolved the query against, if it named one.
    pub market_id: Option<MarketId>,
    /// Outcome chosen by the judge.
    pub outcome: Outcome,
    /// Judge's confidence in `outcome`, in `[0, 1]`.
    pub confidence: Confidence,
    /// Rule applied by the judge, if the verdict or reasoning names one.
    pub rule_id: Option<RuleId>,
    /// Collectors that contributed evidence.
    pub collectors_used: Vec<CollectorName>,
    /// Number of evidence bundles collected.
    pub evidence_count: usize,
    /// One-line summaries of the first evidence bundles.
    pub highlights: Vec<String>,
    /// Summary line from the audit step's reasoning trace.
    pub reasoning_summary: Option<String>,
    /// Hash commitments from the bundle step, keyed by root name.
    pub roots: BTreeMap<String, String>,
    /// Per-step durations, in execution order.
    pub step_timings: Vec<StepTiming>,
    /// Full verdict document from the judge step.
    pub verdict: Value,
    /// Bundle document from the bundle step.
    pub bundle: Value,
}

impl Report {
    /// Folds the five step results into a report.
    pub fn assemble(
        run_id: PipelineRunId,
        options: &PipelineOptions,
        results: RunResults,
        step_timings: Vec<StepTiming>,
    ) -> Self {
        let RunResults {
            prompt,
            collect,
            audit,
            judge,
            bundle,
        } = results;

        let verdict = Value::Object(judge.verdict);
        let reasoning = Value::Object(audit.reasoning_trace);

        let rule_id = first_str(&verdict, RULE_ID_KEYS)
            .or_else(|| first_str(&reasoning, RULE_ID_KEYS))
            .and_then(|id| RuleId::new(id));

        let highlights = collect
            .evidence_bundles
            .iter()
            .filter_map(|item| first_str(item, HIGHLIGHT_KEYS))
            .take(MAX_HIGHLIGHTS)
            .map(truncate_highlight)
            .collect();

        Self {
            run_id,
            generated_at: Timestamp::now(),
            query: options.query.clone(),
            market_id: prompt.market_id(),
            outcome: judge.outcome,
            confidence: judge.confidence,
            rule_id,
            collectors_used: collect.collectors_used,
            evidence_count: collect.evidence_bundles.len(),
            highlights,
            reasoning_summary: first_str(&reasoning, REASONING_SUMMARY_KEYS).map(str::to_string),
            roots: bundle.roots,
            step_timings,
            verdict,
            bundle: bundle.bundle,
        }
    }

    /// Returns a [`Display`](fmt::Display) adapter that renders the report as
    /// markdown.
    pub fn to_markdown(&self) -> MarkdownReport<'_> {
        MarkdownReport(self)
    }
}

fn truncate_highlight(text: &str) -> String {
    if text.chars().count() <= MAX_HIGHLIGHT_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_HIGHLIGHT_CHARS).collect();
    cut.push_str("...");
    cut
}

// ---------------------------------------------------------------------------
// Markdown rendering
// ---------------------------------------------------------------------------

/// Markdown rendering of a [`Report`].
pub struct MarkdownReport<'a>(&'a Report);

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        writeln!(f, "# Resolution Report")?;
        writeln!(f)?;
        writeln!(f, "> {}", r.query)?;
        writeln!(f)?;
        writeln!(f, "| Field | Value |")?;
        writeln!(f, "|-------|-------|")?;
        writeln!(f, "| Outcome | **{}** |", r.outcome)?;
        writeln!(f, "| Confidence | {} |", r.confidence)?;
        writeln!(f, "| Market | {} |", or_dash(r.market_id.as_ref()))?;
        writeln!(f, "| Rule | {} |", or_dash(r.rule_id.as_ref()))?;
        writeln!(f, "| Evidence bundles | {} |", r.evidence_count)?;
        let collectors: Vec<&str> = r.collectors_used.iter().map(CollectorName::as_str).collect();
        if collectors.is_empty() {
            writeln!(f, "| Collectors | - |")?;
        } else {
            writeln!(f, "| Collectors | {} |", collectors.join(", "))?;
        }
        writeln!(f, "| Run | `{}` |", r.run_id)?;
        writeln!(f, "| Generated | {} |", r.generated_at)?;

        if !r.highlights.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Highlights")?;
            writeln!(f)?;
            for highlight in &r.highlights {
                writeln!(f, "- {highlight}")?;
            }
        }

        if let Some(summary) = &r.reasoning_summary {
            writeln!(f)?;
            writeln!(f, "## Reasoning")?;
            writeln!(f)?;
            writeln!(f, "{summary}")?;
        }

        writeln!(f)?;
        writeln!(f, "## Roots")?;
        writeln!(f)?;
        for (name, hash) in &r.roots {
            writeln!(f, "- `{name}`: `{hash}`")?;
        }

        if !r.step_timings.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Timings")?;
            writeln!(f)?;
            for timing in &r.step_timings {
                writeln!(f, "- {}: {} ms", timing.step, timing.duration_ms)?;
            }
        }
        Ok(())
    }
}

fn or_dash<T: fmt::Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "-".to_string(), ToString::to_string)
}
