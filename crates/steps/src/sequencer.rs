//! The five-step resolution sequence.
//!
//! | Step | Consumes | Produces |
//! |------|----------|----------|
//! | prompt | query, strict mode | prompt spec, tool plan, market id |
//! | collect | prompt spec, tool plan, collectors, raw-content flag | evidence bundles, collectors used |
//! | audit | prompt spec, evidence | reasoning trace |
//! | judge | prompt spec, evidence, reasoning | verdict, outcome, confidence |
//! | bundle | prompt spec, evidence, reasoning, verdict | roots, bundle |
//!
//! Steps run strictly in order. The first failure (gateway or validation)
//! aborts the run; no partial report is produced.

use std::time::Instant;

use pipeline::{
    audit_request, bundle_request, collect_request, judge_request, prompt_request, validate_step,
    AuditResult, BundleResult, CollectResult, Gateway, JudgeResult, PipelineError,
    PipelineOptions, PipelineRunId, PromptResult, Report, RunResults, StepResponse, StepTiming,
};
use serde_json::Value;
use tracing::{info, info_span, Instrument};

/// Logical method sent with every step call.
pub const STEP_METHOD: &str = "POST";

/// Runs the full resolution pipeline for `options`.
///
/// # Errors
///
/// - [`PipelineError::Configuration`] if the query is blank (no call is made).
/// - [`PipelineError::Gateway`] naming the first step whose call failed; the
///   gateway error is passed through unchanged.
/// - [`PipelineError::Validation`] naming the first step whose response had
///   the wrong shape.
pub async fn run_pipeline<G: Gateway + ?Sized>(
    gateway: &G,
    options: &PipelineOptions,
) -> Result<Report, PipelineError> {
    if options.query.trim().is_empty() {
        return Err(PipelineError::Configuration {
            message: "query must not be empty".to_string(),
        });
    }

    let run_id = PipelineRunId::new_random();
    let span = info_span!("pipeline.run", run_id = %run_id);
    async move {
        let mut timings = Vec::with_capacity(5);

        let prompt: PromptResult = execute(gateway, prompt_request(options), &mut timings).await?;
        let collect: CollectResult =
            execute(gateway, collect_request(options, &prompt), &mut timings).await?;
        let audit: AuditResult =
            execute(gateway, audit_request(&prompt, &collect), &mut timings).await?;
        let judge: JudgeResult =
            execute(gateway, judge_request(&prompt, &collect, &audit), &mut timings).await?;
        let bundle: BundleResult = execute(
            gateway,
            bundle_request(&prompt, &collect, &audit, &judge),
            &mut timings,
        )
        .await?;

        info!(outcome = %judge.outcome, confidence = %judge.confidence, "pipeline completed");
        let results = RunResults {
            prompt,
            collect,
            audit,
            judge,
            bundle,
        };
        Ok(Report::assemble(run_id, options, results, timings))
    }
    .instrument(span)
    .await
}

/// Calls the gateway for `T::STEP`, validates the response and records the
/// step's duration.
async fn execute<T, G>(
    gateway: &G,
    payload: Value,
    timings: &mut Vec<StepTiming>,
) -> Result<T, PipelineError>
where
    T: StepResponse,
    G: Gateway + ?Sized,
{
    let step = T::STEP;
    let started = Instant::now();

    let body = gateway
        .call(step.route(), STEP_METHOD, &payload)
        .await
        .map_err(|source| PipelineError::Gateway { step, source })?;
    let result = validate_step::<T>(body)?;

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(step = %step, duration_ms, "step completed");
    timings.push(StepTiming { step, duration_ms });
    Ok(result)
}
