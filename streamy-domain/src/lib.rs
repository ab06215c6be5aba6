//! Core data model for the Streamy pipeline execution engine.
//!
//! This crate has no knowledge of concurrency, I/O, or plugin execution; it
//! holds the typed shapes shared by the planner, executor, and aggregator in
//! `streamy-core`, plus the structured error type both crates raise.

pub mod error;
pub mod pipeline;
pub mod plan;
pub mod result;
pub mod status;
pub mod step;

pub use error::{ErrorDetail, StreamyError};
pub use pipeline::{Pipeline, PipelineSettings, PostRunValidation};
pub use plan::{sort_level, validate_pipeline, ExecutionPlan, Level};
pub use result::{EvaluationResult, ExecutionRecord, StepResult, VerdictCounts};
pub use status::{PipelineStatus, SkipReason, StepStatus, Verdict};
pub use step::Step;
