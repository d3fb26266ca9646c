//! Cournot resolver step sequencer.
//!
//! Drives the five dependent gateway calls of a resolution run (prompt,
//! collect, audit, judge, bundle) and folds their results into a
//! [`pipeline::Report`]. Also exposes the capabilities query.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The sequencer threads prior-step outputs into the
//! next request and validates each response; it never interprets payload
//! contents and performs no local recovery. Retry belongs to the gateway.

pub mod capabilities;
pub mod sequencer;

pub use capabilities::{capabilities, CAPABILITIES_METHOD, CAPABILITIES_PATH};
pub use sequencer::{run_pipeline, STEP_METHOD};
