// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pipeline service façade (C7): one call per CLI verb.
//!
//! The façade is the single place that binds a correlation ID into the
//! call and emits the four structured lifecycle events. It wires C1-C6
//! (config loading, planning, the registry, the executor, and aggregation)
//! behind three synchronous-to-the-caller entry points.

use crate::aggregate::{aggregate_apply, aggregate_verification};
use crate::cancel::RunContext;
use crate::config::load_pipeline;
use crate::correlation::CorrelationId;
use crate::events::{DomainEvent, EventPublisher, NullEventPublisher};
use crate::executor::{Callbacks, Executor, RunOptions};
use crate::planner::build_plan;
use crate::registry::PluginRegistry;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use streamy_domain::{EvaluationResult, ExecutionPlan, ExecutionRecord, Pipeline, StepResult, StreamyError};

/// Caller-supplied overrides for a single verify/apply call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub per_step_timeout: Option<Duration>,
    pub verbose: bool,
    pub dry_run: bool,
    pub continue_on_error: Option<bool>,
}

/// Wires the pipeline execution engine together behind three entry points.
pub struct PipelineService {
    registry: Arc<PluginRegistry>,
    events: Arc<dyn EventPublisher>,
}

impl PipelineService {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            events: Arc::new(NullEventPublisher),
        }
    }

    pub fn with_event_publisher(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = events;
        self
    }

    /// Loads the config document and builds an execution plan without
    /// running anything.
    #[tracing::instrument(skip(self), fields(correlation_id = tracing::field::Empty))]
    pub fn prepare(&self, path: &Path) -> Result<(Pipeline, ExecutionPlan), StreamyError> {
        let correlation_id = CorrelationId::new();
        tracing::Span::current().record("correlation_id", tracing::field::display(correlation_id));
        let pipeline = load_pipeline(path)?;
        let plan = build_plan(&pipeline)?;
        Ok((pipeline, plan))
    }

    /// Read-only pass: calls only `evaluate` for every step in the plan.
    ///
    /// `prepare` failures (bad config, a dependency cycle) are returned as
    /// `Err` before any record exists. Once the run starts, this always
    /// returns `Ok` with the aggregated record, even if the run was
    /// cancelled or hit the total deadline — `record.error` carries that
    /// top-level failure alongside whatever partial results were collected.
    #[tracing::instrument(skip(self, options), fields(correlation_id = tracing::field::Empty))]
    pub async fn verify(&self, path: &Path, options: CallOptions) -> Result<(Pipeline, Vec<EvaluationResult>, ExecutionRecord), StreamyError> {
        let correlation_id = CorrelationId::new();
        tracing::Span::current().record("correlation_id", tracing::field::display(correlation_id));

        let (pipeline, plan) = self.prepare(path)?;
        let run_options = merged_options(&pipeline, &options, false);
        let ctx = RunContext::root(run_options.per_step_timeout, plan.step_count());

        self.events.publish(DomainEvent::new("pipeline_started", correlation_id.to_string()).with("pipeline", pipeline.name.clone()));

        let events = self.events.clone();
        let corr = correlation_id.to_string();
        let callbacks = Callbacks {
            on_step_start: None,
            on_step_result: Some(Arc::new(move |step_id: &str, verdict: &str| {
                events.publish(
                    DomainEvent::new("step_evaluated", corr.clone())
                        .with("step_id", step_id.to_string())
                        .with("verdict", verdict.to_string()),
                );
            })),
        };

        let executor = Executor::new(self.registry.clone());
        let start = Instant::now();
        let (results, top_error) = executor.verify(&pipeline, &plan, &ctx, &run_options, &callbacks).await;
        let mut record = aggregate_verification(path.display().to_string(), &results, start.elapsed());
        if let Some(err) = &top_error {
            record.error = Some(streamy_domain::ErrorDetail::from_error(err));
        }

        self.events.publish(
            DomainEvent::new("pipeline_completed", correlation_id.to_string()).with("status", record.status.as_wire_str().to_string()),
        );

        Ok((pipeline, results, record))
    }

    /// Mutating pass: drives the executor's apply lifecycle.
    ///
    /// Same error contract as [`Self::verify`]: once the run starts, the
    /// partial record is always returned, with `record.error` set when the
    /// run was cancelled or the total deadline expired.
    #[tracing::instrument(skip(self, options), fields(correlation_id = tracing::field::Empty))]
    pub async fn apply(&self, path: &Path, options: CallOptions) -> Result<(Pipeline, Vec<StepResult>, ExecutionRecord), StreamyError> {
        let correlation_id = CorrelationId::new();
        tracing::Span::current().record("correlation_id", tracing::field::display(correlation_id));

        let (pipeline, plan) = self.prepare(path)?;
        let run_options = merged_options(&pipeline, &options, options.dry_run);
        let ctx = RunContext::root(run_options.per_step_timeout, plan.step_count());

        self.events.publish(DomainEvent::new("pipeline_started", correlation_id.to_string()).with("pipeline", pipeline.name.clone()));

        let events = self.events.clone();
        let corr = correlation_id.to_string();
        let callbacks = Callbacks {
            on_step_start: None,
            on_step_result: Some(Arc::new(move |step_id: &str, status: &str| {
                events.publish(
                    DomainEvent::new("step_applied", corr.clone())
                        .with("step_id", step_id.to_string())
                        .with("status", status.to_string()),
                );
            })),
        };

        let executor = Executor::new(self.registry.clone());
        let start = Instant::now();
        let (results, top_error) = executor.apply(&pipeline, &plan, &ctx, &run_options, &callbacks).await;
        let mut record = aggregate_apply(path.display().to_string(), &results, start.elapsed());
        if let Some(err) = &top_error {
            record.error = Some(streamy_domain::ErrorDetail::from_error(err));
        }

        self.events.publish(
            DomainEvent::new("pipeline_completed", correlation_id.to_string()).with("status", record.status.as_wire_str().to_string()),
        );

        Ok((pipeline, results, record))
    }
}

fn merged_options(pipeline: &Pipeline, options: &CallOptions, dry_run: bool) -> RunOptions {
    let mut run_options = RunOptions::from_settings(&pipeline.settings);
    if let Some(timeout) = options.per_step_timeout {
        run_options.per_step_timeout = timeout;
    }
    if let Some(continue_on_error) = options.continue_on_error {
        run_options.continue_on_error = continue_on_error;
    }
    run_options.dry_run = dry_run;
    run_options.verbose = options.verbose;
    run_options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingEventPublisher;
    use crate::plugins::NoopPlugin;
    use std::io::Write;
    use streamy_domain::StepStatus;

    fn write_pipeline(dir: &tempfile::TempDir, yaml: &str) -> std::path::PathBuf {
        let path = dir.path().join("pipeline.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn verify_emits_lifecycle_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pipeline(
            &dir,
            "name: demo\nsteps:\n  - id: a\n    type_tag: noop\n    name: A\n",
        );

        let mut registry = PluginRegistry::new();
        registry.register("noop", Arc::new(NoopPlugin)).unwrap();
        let publisher = Arc::new(RecordingEventPublisher::new());
        let service = PipelineService::new(Arc::new(registry)).with_event_publisher(publisher.clone());

        let (_, results, record) = service.verify(&path, CallOptions::default()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(record.status.as_wire_str(), "satisfied");

        let event_types: Vec<&str> = publisher.events().iter().map(|e| e.event_type).collect();
        assert!(event_types.contains(&"pipeline_started"));
        assert!(event_types.contains(&"step_evaluated"));
        assert!(event_types.contains(&"pipeline_completed"));
    }

    #[tokio::test]
    async fn prepare_surfaces_cycle_as_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pipeline(
            &dir,
            "name: demo\nsteps:\n  - id: x\n    type_tag: noop\n    name: X\n    depends_on: [y]\n  - id: y\n    type_tag: noop\n    name: Y\n    depends_on: [x]\n",
        );
        let registry = PluginRegistry::new();
        let service = PipelineService::new(Arc::new(registry));
        let err = service.prepare(&path).unwrap_err();
        assert_eq!(err.code(), "cycle");
    }

    #[tokio::test]
    async fn apply_returns_partial_record_when_total_deadline_is_already_expired() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pipeline(
            &dir,
            "name: demo\nsteps:\n  - id: a\n    type_tag: noop\n    name: A\n  - id: b\n    type_tag: noop\n    name: B\n    depends_on: [a]\n",
        );

        let mut registry = PluginRegistry::new();
        registry.register("noop", Arc::new(NoopPlugin)).unwrap();
        let service = PipelineService::new(Arc::new(registry));

        // A zero per-step timeout yields a zero total deadline, so the run
        // is cancelled before the first level is even dispatched.
        let options = CallOptions { per_step_timeout: Some(std::time::Duration::ZERO), ..CallOptions::default() };
        let (_, results, record) = service.apply(&path, options).await.unwrap();
        assert!(record.error.is_some());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status == StepStatus::Skipped));
    }
}
