// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Drives a plan: bounded-parallel workers per level, timeouts, cancellation,
//! and per-step result collection.
//!
//! [`Executor::apply`] is C4; [`Executor::verify`] is its read-only twin
//! (C5). Both share the level barrier and concurrency control described in
//! the concurrency model: levels run strictly in order, up to `max_parallelism`
//! steps run concurrently within a level, and a level completes only once
//! every member has a terminal result.

pub mod supervisor;

use crate::cancel::RunContext;
use crate::metrics::{ExecutorMetrics, MetricsSnapshot};
use crate::registry::PluginRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use streamy_domain::{EvaluationResult, ExecutionPlan, Pipeline, SkipReason, Step, StepResult, StepStatus, Verdict};
use supervisor::{join_supervised, spawn_supervised};
use tokio::sync::Semaphore;

/// Per-call options overriding pipeline defaults.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub per_step_timeout: Duration,
    pub max_parallelism: usize,
    pub continue_on_error: bool,
    pub dry_run: bool,
    pub verbose: bool,
}

impl RunOptions {
    pub fn from_settings(settings: &streamy_domain::PipelineSettings) -> Self {
        Self {
            per_step_timeout: Duration::from_secs(settings.default_timeout_seconds),
            max_parallelism: settings.max_parallelism,
            continue_on_error: settings.continue_on_error,
            dry_run: settings.dry_run,
            verbose: settings.verbose,
        }
    }
}

type StepStartCallback = Arc<dyn Fn(&str) + Send + Sync>;
type StepResultCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Optional progress hooks invoked as steps start and finish.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_step_start: Option<StepStartCallback>,
    pub on_step_result: Option<StepResultCallback>,
}

/// Drives plan execution against a registry of plugins.
pub struct Executor {
    registry: Arc<PluginRegistry>,
    metrics: ExecutorMetrics,
}

fn flatten_index(plan: &ExecutionPlan) -> HashMap<String, usize> {
    plan.levels
        .iter()
        .flatten()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect()
}

impl Executor {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry, metrics: ExecutorMetrics::new() }
    }

    /// Snapshot of step-outcome counters accumulated across every
    /// `apply` call driven by this executor instance.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Drives an apply run. Returns the per-step results in plan order plus
    /// a top-level error if the call was short-circuited (cancellation or
    /// an unrecoverable internal invariant).
    #[tracing::instrument(skip_all, fields(pipeline = %pipeline.name, dry_run = options.dry_run))]
    pub async fn apply(
        &self,
        pipeline: &Pipeline,
        plan: &ExecutionPlan,
        ctx: &RunContext,
        options: &RunOptions,
        callbacks: &Callbacks,
    ) -> (Vec<StepResult>, Option<streamy_domain::StreamyError>) {
        let index_of = flatten_index(plan);
        let total = plan.step_count();
        let mut slots: Vec<Option<StepResult>> = (0..total).map(|_| None).collect();
        let semaphore = Arc::new(Semaphore::new(options.max_parallelism.max(1)));
        let failed: Arc<parking_lot::RwLock<HashSet<String>>> = Arc::new(parking_lot::RwLock::new(HashSet::new()));
        let mut top_level_error = None;
        let mut levels_iter = plan.levels.iter().peekable();

        while let Some(level) = levels_iter.next() {
            if ctx.is_expired() {
                ctx.cancel();
            }
            if ctx.is_cancelled() {
                top_level_error.get_or_insert(streamy_domain::StreamyError::Cancelled(
                    "run cancelled before all levels dispatched".to_string(),
                ));
                fill_remaining_apply(&mut slots, &index_of, level, SkipReason::Cancelled);
                for remaining in levels_iter {
                    fill_remaining_apply(&mut slots, &index_of, remaining, SkipReason::Cancelled);
                }
                break;
            }

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<StepResult>();
            let mut handles = Vec::with_capacity(level.len());
            for step_id in level {
                let step = pipeline.find_step(step_id).expect("planner only emits known steps").clone();
                let registry = self.registry.clone();
                let semaphore = semaphore.clone();
                let child_ctx = ctx.child(step.timeout, options.per_step_timeout);
                let root_ctx = ctx.clone();
                let dependency_failed = !failed.read().is_disjoint(&step.depends_on.iter().cloned().collect());
                let dry_run = options.dry_run;
                let tx = tx.clone();
                let on_step_start = callbacks.on_step_start.clone();

                let handle = spawn_supervised(async move {
                    if let Some(cb) = &on_step_start {
                        cb(&step.id);
                    }
                    let result = run_apply_step(&registry, &step, &child_ctx, &root_ctx, &semaphore, dependency_failed, dry_run).await;
                    let _ = tx.send(result);
                });
                handles.push(handle);
            }
            drop(tx);
            for handle in handles {
                let _ = join_supervised(handle).await;
            }
            while let Some(result) = rx.recv().await {
                if matches!(result.status, StepStatus::Failed) {
                    failed.write().insert(result.step_id.clone());
                }
                match result.status {
                    StepStatus::Skipped => self.metrics.record_skipped(),
                    StepStatus::Failed => {
                        self.metrics.record_evaluated();
                        self.metrics.record_failed();
                    }
                    _ => {
                        self.metrics.record_evaluated();
                        self.metrics.record_applied(result.duration);
                    }
                }
                if let Some(cb) = &callbacks.on_step_result {
                    cb(&result.step_id, result.status.as_wire_str());
                }
                if let Some(idx) = index_of.get(&result.step_id) {
                    slots[*idx] = Some(result);
                }
            }

            if !options.continue_on_error && !failed.read().is_empty() {
                for remaining in levels_iter {
                    fill_remaining_apply(&mut slots, &index_of, remaining, SkipReason::DependencyFailed);
                }
                break;
            }
        }

        let results = slots.into_iter().flatten().collect();
        (results, top_level_error)
    }

    /// Drives a verify run: only `evaluate` is invoked.
    #[tracing::instrument(skip_all, fields(pipeline = %pipeline.name))]
    pub async fn verify(
        &self,
        pipeline: &Pipeline,
        plan: &ExecutionPlan,
        ctx: &RunContext,
        options: &RunOptions,
        callbacks: &Callbacks,
    ) -> (Vec<EvaluationResult>, Option<streamy_domain::StreamyError>) {
        let index_of = flatten_index(plan);
        let total = plan.step_count();
        let mut slots: Vec<Option<EvaluationResult>> = (0..total).map(|_| None).collect();
        let semaphore = Arc::new(Semaphore::new(options.max_parallelism.max(1)));
        let propagate: Arc<parking_lot::RwLock<HashSet<String>>> = Arc::new(parking_lot::RwLock::new(HashSet::new()));
        let mut top_level_error = None;
        let mut levels_iter = plan.levels.iter().peekable();

        while let Some(level) = levels_iter.next() {
            if ctx.is_expired() {
                ctx.cancel();
            }
            if ctx.is_cancelled() {
                top_level_error.get_or_insert(streamy_domain::StreamyError::Cancelled(
                    "run cancelled before all levels dispatched".to_string(),
                ));
                fill_remaining_verify(&mut slots, &index_of, level);
                for remaining in levels_iter {
                    fill_remaining_verify(&mut slots, &index_of, remaining);
                }
                break;
            }

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<(EvaluationResult, bool)>();
            let mut handles = Vec::with_capacity(level.len());
            for step_id in level {
                let step = pipeline.find_step(step_id).expect("planner only emits known steps").clone();
                let registry = self.registry.clone();
                let semaphore = semaphore.clone();
                let child_ctx = ctx.child(step.timeout, options.per_step_timeout);
                let dependency_failed = !propagate.read().is_disjoint(&step.depends_on.iter().cloned().collect());
                let tx = tx.clone();
                let on_step_start = callbacks.on_step_start.clone();

                let handle = spawn_supervised(async move {
                    if let Some(cb) = &on_step_start {
                        cb(&step.id);
                    }
                    let (result, should_propagate) = run_verify_step(&registry, &step, &child_ctx, &semaphore, dependency_failed).await;
                    let _ = tx.send((result, should_propagate));
                });
                handles.push(handle);
            }
            drop(tx);
            for handle in handles {
                let _ = join_supervised(handle).await;
            }
            while let Some((result, should_propagate)) = rx.recv().await {
                if should_propagate {
                    propagate.write().insert(result.step_id.clone());
                }
                if let Some(cb) = &callbacks.on_step_result {
                    cb(&result.step_id, result.verdict.as_wire_str());
                }
                if let Some(idx) = index_of.get(&result.step_id) {
                    slots[*idx] = Some(result);
                }
            }
        }

        let results = slots.into_iter().flatten().collect();
        (results, top_level_error)
    }
}

fn fill_remaining_apply(slots: &mut [Option<StepResult>], index_of: &HashMap<String, usize>, level: &[String], reason: SkipReason) {
    for id in level {
        if let Some(idx) = index_of.get(id) {
            if slots[*idx].is_none() {
                slots[*idx] = Some(StepResult::skipped(id, reason, Duration::ZERO));
            }
        }
    }
}

fn fill_remaining_verify(slots: &mut [Option<EvaluationResult>], index_of: &HashMap<String, usize>, level: &[String]) {
    for id in level {
        if let Some(idx) = index_of.get(id) {
            if slots[*idx].is_none() {
                slots[*idx] = Some(EvaluationResult::new(id, Verdict::Unknown, "not evaluated: run cancelled"));
            }
        }
    }
}

/// Implements the apply per-step lifecycle: resolve plugin, evaluate,
/// decide, apply if needed, then record the outcome.
async fn run_apply_step(
    registry: &PluginRegistry,
    step: &Step,
    child_ctx: &RunContext,
    root_ctx: &RunContext,
    semaphore: &Arc<Semaphore>,
    dependency_failed: bool,
    dry_run: bool,
) -> StepResult {
    let start = Instant::now();

    if root_ctx.is_cancelled() {
        return StepResult::skipped(&step.id, SkipReason::Cancelled, start.elapsed());
    }
    if dependency_failed {
        return StepResult::skipped(&step.id, SkipReason::DependencyFailed, start.elapsed());
    }

    let plugin = match registry.get(&step.type_tag) {
        Ok(p) => p,
        Err(err) => {
            return StepResult::new(&step.id, StepStatus::Failed, err.to_string(), start.elapsed())
                .with_error(streamy_domain::ErrorDetail::from_error(&err));
        }
    };

    let _permit = semaphore.acquire().await.expect("semaphore is never closed while in use");

    let evaluation = match run_with_deadline(child_ctx, root_ctx, plugin.evaluate(child_ctx, step)).await {
        Ok(Ok(eval)) => eval,
        Ok(Err(err)) => {
            return StepResult::new(&step.id, StepStatus::Failed, err.to_string(), start.elapsed())
                .with_error(streamy_domain::ErrorDetail::from_error(&err));
        }
        Err(timeout_err) => {
            return StepResult::new(&step.id, StepStatus::Failed, timeout_err.to_string(), start.elapsed())
                .with_error(streamy_domain::ErrorDetail::from_error(&timeout_err));
        }
    };

    if evaluation.verdict == Verdict::Satisfied {
        return StepResult::new(&step.id, StepStatus::AlreadySatisfied, evaluation.message.clone(), start.elapsed());
    }

    if dry_run {
        let (status, message) = match evaluation.verdict {
            Verdict::Missing => (StepStatus::WouldCreate, "would create".to_string()),
            Verdict::Drifted => (StepStatus::WouldUpdate, "would update".to_string()),
            Verdict::Blocked | Verdict::Unknown => (StepStatus::Skipped, "skipped: blocked".to_string()),
            Verdict::Satisfied => unreachable!("handled above"),
        };
        return StepResult::new(&step.id, status, message, start.elapsed());
    }

    match run_with_deadline(child_ctx, root_ctx, plugin.apply(child_ctx, &evaluation, step)).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => StepResult::new(&step.id, StepStatus::Failed, err.to_string(), start.elapsed())
            .with_error(streamy_domain::ErrorDetail::from_error(&err)),
        Err(timeout_err) => StepResult::new(&step.id, StepStatus::Failed, timeout_err.to_string(), start.elapsed())
            .with_error(streamy_domain::ErrorDetail::from_error(&timeout_err)),
    }
}

/// Implements the read-only verify per-step lifecycle. Returns the result
/// plus whether this step's outcome should propagate as a dependency failure
/// to its dependents.
async fn run_verify_step(
    registry: &PluginRegistry,
    step: &Step,
    child_ctx: &RunContext,
    semaphore: &Arc<Semaphore>,
    dependency_failed: bool,
) -> (EvaluationResult, bool) {
    if child_ctx.is_cancelled() {
        return (EvaluationResult::new(&step.id, Verdict::Unknown, "skipped: cancelled"), false);
    }
    if dependency_failed {
        return (EvaluationResult::new(&step.id, Verdict::Unknown, "skipped: dependency_failed"), true);
    }

    let plugin = match registry.get(&step.type_tag) {
        Ok(p) => p,
        Err(err) => {
            return (EvaluationResult::new(&step.id, Verdict::Blocked, err.to_string()), true);
        }
    };

    let _permit = semaphore.acquire().await.expect("semaphore is never closed while in use");

    match tokio::time::timeout(child_ctx.remaining(), plugin.evaluate(child_ctx, step)).await {
        Ok(Ok(eval)) => {
            let propagate = matches!(eval.verdict, Verdict::Blocked);
            (eval, propagate)
        }
        Ok(Err(err)) => (EvaluationResult::new(&step.id, Verdict::Blocked, err.to_string()), true),
        Err(_) => (EvaluationResult::new(&step.id, Verdict::Blocked, "evaluate exceeded its deadline"), true),
    }
}

/// Runs a plugin future under the child deadline, mapping expiry into a
/// `timeout` error and parent cancellation into a `cancelled` error.
async fn run_with_deadline<T>(
    child_ctx: &RunContext,
    root_ctx: &RunContext,
    future: impl std::future::Future<Output = Result<T, streamy_domain::StreamyError>>,
) -> Result<Result<T, streamy_domain::StreamyError>, streamy_domain::StreamyError> {
    match tokio::time::timeout(child_ctx.remaining(), future).await {
        Ok(outcome) => Ok(outcome),
        Err(_elapsed) => {
            if root_ctx.is_cancelled() {
                Err(streamy_domain::StreamyError::Cancelled("parent context was cancelled".to_string()))
            } else {
                Err(streamy_domain::StreamyError::Timeout("step exceeded its deadline".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{Plugin, PluginMetadata};
    use crate::registry::PluginRegistry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use streamy_domain::{Pipeline, StreamyError};

    struct AlwaysSatisfied;

    #[async_trait]
    impl Plugin for AlwaysSatisfied {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new("noop", "1.0.0", "noop")
        }
        async fn evaluate(&self, _ctx: &RunContext, step: &Step) -> Result<EvaluationResult, StreamyError> {
            Ok(EvaluationResult::satisfied(&step.id, "already there"))
        }
        async fn apply(&self, _ctx: &RunContext, _prior: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError> {
            Ok(StepResult::new(&step.id, StepStatus::Success, "created", Duration::ZERO))
        }
    }

    struct AlwaysMissing {
        apply_calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Plugin for AlwaysMissing {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new("file", "1.0.0", "file")
        }
        async fn evaluate(&self, _ctx: &RunContext, step: &Step) -> Result<EvaluationResult, StreamyError> {
            Ok(EvaluationResult::new(&step.id, Verdict::Missing, "absent"))
        }
        async fn apply(&self, _ctx: &RunContext, _prior: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError> {
            self.apply_calls.fetch_add(1, Ordering::SeqCst);
            Ok(StepResult::new(&step.id, StepStatus::Success, "created", Duration::ZERO))
        }
    }

    fn registry_with(tag: &str, plugin: Arc<dyn Plugin>) -> Arc<PluginRegistry> {
        let mut registry = PluginRegistry::new();
        registry.register(tag, plugin).unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn apply_records_metrics_for_each_outcome() {
        let pipeline = Pipeline::new(
            "p",
            vec![streamy_domain::Step::new("a", "noop", "A"), streamy_domain::Step::new("f", "file", "F")],
        );
        let plan = crate::planner::build_plan(&pipeline).unwrap();
        let mut registry = PluginRegistry::new();
        registry.register("noop", Arc::new(AlwaysSatisfied) as Arc<dyn Plugin>).unwrap();
        registry.register("file", Arc::new(AlwaysMissing { apply_calls: Arc::new(AtomicUsize::new(0)) }) as Arc<dyn Plugin>).unwrap();
        let executor = Executor::new(Arc::new(registry));
        let ctx = RunContext::root(Duration::from_secs(5), 2);
        let options = RunOptions::from_settings(&pipeline.settings);
        executor.apply(&pipeline, &plan, &ctx, &options, &Callbacks::default()).await;
        let snapshot = executor.metrics();
        assert_eq!(snapshot.steps_evaluated, 2);
        assert_eq!(snapshot.steps_applied, 2);
        assert_eq!(snapshot.steps_failed, 0);
    }

    #[tokio::test]
    async fn satisfied_steps_skip_apply() {
        let pipeline = Pipeline::new("p", vec![streamy_domain::Step::new("a", "noop", "A")]);
        let plan = crate::planner::build_plan(&pipeline).unwrap();
        let registry = registry_with("noop", Arc::new(AlwaysSatisfied));
        let executor = Executor::new(registry);
        let ctx = RunContext::root(Duration::from_secs(5), 1);
        let options = RunOptions::from_settings(&pipeline.settings);
        let (results, top_error) = executor.apply(&pipeline, &plan, &ctx, &options, &Callbacks::default()).await;
        assert!(top_error.is_none());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, StepStatus::AlreadySatisfied);
    }

    #[tokio::test]
    async fn verify_then_apply_performs_no_mutation_when_satisfied() {
        let pipeline = Pipeline::new("p", vec![streamy_domain::Step::new("a", "noop", "A")]);
        let plan = crate::planner::build_plan(&pipeline).unwrap();
        let registry = registry_with("noop", Arc::new(AlwaysSatisfied));
        let executor = Executor::new(registry);
        let ctx = RunContext::root(Duration::from_secs(5), 1);
        let options = RunOptions::from_settings(&pipeline.settings);
        let (eval_results, _) = executor.verify(&pipeline, &plan, &ctx, &options, &Callbacks::default()).await;
        assert_eq!(eval_results[0].verdict, Verdict::Satisfied);
        let (apply_results, _) = executor.apply(&pipeline, &plan, &ctx, &options, &Callbacks::default()).await;
        assert_eq!(apply_results[0].status, StepStatus::AlreadySatisfied);
    }

    #[tokio::test]
    async fn drift_reconciles_and_counts_a_mutating_apply() {
        let pipeline = Pipeline::new("p", vec![streamy_domain::Step::new("f", "file", "F")]);
        let plan = crate::planner::build_plan(&pipeline).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with("file", Arc::new(AlwaysMissing { apply_calls: calls.clone() }));
        let executor = Executor::new(registry);
        let ctx = RunContext::root(Duration::from_secs(5), 1);
        let options = RunOptions::from_settings(&pipeline.settings);
        let (results, _) = executor.apply(&pipeline, &plan, &ctx, &options, &Callbacks::default()).await;
        assert_eq!(results[0].status, StepStatus::Success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dry_run_maps_missing_to_would_create_without_apply() {
        let mut pipeline = Pipeline::new("p", vec![streamy_domain::Step::new("f", "file", "F")]);
        pipeline.settings.dry_run = true;
        let plan = crate::planner::build_plan(&pipeline).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with("file", Arc::new(AlwaysMissing { apply_calls: calls.clone() }));
        let executor = Executor::new(registry);
        let ctx = RunContext::root(Duration::from_secs(5), 1);
        let options = RunOptions::from_settings(&pipeline.settings);
        let (results, _) = executor.apply(&pipeline, &plan, &ctx, &options, &Callbacks::default()).await;
        assert_eq!(results[0].status, StepStatus::WouldCreate);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dependency_failure_skips_dependents_without_continue_on_error() {
        struct Failing;
        #[async_trait]
        impl Plugin for Failing {
            fn metadata(&self) -> PluginMetadata {
                PluginMetadata::new("fail", "1.0.0", "fail")
            }
            async fn evaluate(&self, _ctx: &RunContext, _step: &Step) -> Result<EvaluationResult, StreamyError> {
                Err(StreamyError::Execution("boom".to_string()))
            }
            async fn apply(&self, _ctx: &RunContext, _prior: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError> {
                Ok(StepResult::new(&step.id, StepStatus::Success, "unreachable", Duration::ZERO))
            }
        }

        let pipeline = Pipeline::new(
            "p",
            vec![
                streamy_domain::Step::new("a", "fail", "A"),
                streamy_domain::Step::new("b", "fail", "B").with_dependency("a"),
                streamy_domain::Step::new("c", "fail", "C").with_dependency("a"),
            ],
        );
        let plan = crate::planner::build_plan(&pipeline).unwrap();
        let mut registry = PluginRegistry::new();
        registry.register("fail", Arc::new(Failing) as Arc<dyn Plugin>).unwrap();
        let executor = Executor::new(Arc::new(registry));
        let ctx = RunContext::root(Duration::from_secs(5), 3);
        let options = RunOptions::from_settings(&pipeline.settings);
        let (results, _) = executor.apply(&pipeline, &plan, &ctx, &options, &Callbacks::default()).await;
        let by_id: HashMap<&str, &StepResult> = results.iter().map(|r| (r.step_id.as_str(), r)).collect();
        assert_eq!(by_id["a"].status, StepStatus::Failed);
        assert_eq!(by_id["b"].status, StepStatus::Skipped);
        assert_eq!(by_id["c"].status, StepStatus::Skipped);
    }

    #[tokio::test]
    async fn dependency_failure_skips_dependents_even_with_continue_on_error() {
        struct Failing;
        #[async_trait]
        impl Plugin for Failing {
            fn metadata(&self) -> PluginMetadata {
                PluginMetadata::new("fail", "1.0.0", "fail")
            }
            async fn evaluate(&self, _ctx: &RunContext, _step: &Step) -> Result<EvaluationResult, StreamyError> {
                Err(StreamyError::Execution("boom".to_string()))
            }
            async fn apply(&self, _ctx: &RunContext, _prior: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError> {
                Ok(StepResult::new(&step.id, StepStatus::Success, "unreachable", Duration::ZERO))
            }
        }

        let mut pipeline = Pipeline::new(
            "p",
            vec![
                streamy_domain::Step::new("a", "fail", "A"),
                streamy_domain::Step::new("b", "fail", "B").with_dependency("a"),
            ],
        );
        pipeline.settings.continue_on_error = true;
        let plan = crate::planner::build_plan(&pipeline).unwrap();
        let mut registry = PluginRegistry::new();
        registry.register("fail", Arc::new(Failing) as Arc<dyn Plugin>).unwrap();
        let executor = Executor::new(Arc::new(registry));
        let ctx = RunContext::root(Duration::from_secs(5), 2);
        let options = RunOptions::from_settings(&pipeline.settings);
        let (results, _) = executor.apply(&pipeline, &plan, &ctx, &options, &Callbacks::default()).await;
        let by_id: HashMap<&str, &StepResult> = results.iter().map(|r| (r.step_id.as_str(), r)).collect();
        assert_eq!(by_id["a"].status, StepStatus::Failed);
        assert_eq!(by_id["b"].status, StepStatus::Skipped);
        assert_eq!(by_id["b"].skip_reason, Some(SkipReason::DependencyFailed));
    }

    #[tokio::test]
    async fn parallelism_is_capped_at_configured_value() {
        struct Slow {
            in_flight: Arc<AtomicUsize>,
            max_seen: Arc<AtomicUsize>,
        }
        #[async_trait]
        impl Plugin for Slow {
            fn metadata(&self) -> PluginMetadata {
                PluginMetadata::new("slow", "1.0.0", "slow")
            }
            async fn evaluate(&self, _ctx: &RunContext, step: &Step) -> Result<EvaluationResult, StreamyError> {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(EvaluationResult::satisfied(&step.id, "ok"))
            }
            async fn apply(&self, _ctx: &RunContext, _prior: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError> {
                Ok(StepResult::new(&step.id, StepStatus::Success, "ok", Duration::ZERO))
            }
        }

        let steps: Vec<streamy_domain::Step> = (0..8).map(|i| streamy_domain::Step::new(format!("s{i}"), "slow", "S")).collect();
        let mut pipeline = Pipeline::new("p", steps);
        pipeline.settings.max_parallelism = 3;
        let plan = crate::planner::build_plan(&pipeline).unwrap();
        let max_seen = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new();
        registry
            .register("slow", Arc::new(Slow { in_flight: Arc::new(AtomicUsize::new(0)), max_seen: max_seen.clone() }) as Arc<dyn Plugin>)
            .unwrap();
        let executor = Executor::new(Arc::new(registry));
        let ctx = RunContext::root(Duration::from_secs(5), 8);
        let options = RunOptions::from_settings(&pipeline.settings);
        executor.apply(&pipeline, &plan, &ctx, &options, &Callbacks::default()).await;
        assert_eq!(max_seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn timeout_fails_only_the_slow_step() {
        struct SleepsForever;
        #[async_trait]
        impl Plugin for SleepsForever {
            fn metadata(&self) -> PluginMetadata {
                PluginMetadata::new("sleepy", "1.0.0", "sleepy")
            }
            async fn evaluate(&self, _ctx: &RunContext, step: &Step) -> Result<EvaluationResult, StreamyError> {
                if step.id == "slow" {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
                Ok(EvaluationResult::new(&step.id, Verdict::Missing, "absent"))
            }
            async fn apply(&self, _ctx: &RunContext, _prior: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError> {
                Ok(StepResult::new(&step.id, StepStatus::Success, "ok", Duration::ZERO))
            }
        }

        let pipeline = Pipeline::new(
            "p",
            vec![
                streamy_domain::Step::new("slow", "sleepy", "Slow").with_timeout(Duration::from_millis(50)),
                streamy_domain::Step::new("fast", "sleepy", "Fast"),
            ],
        );
        let plan = crate::planner::build_plan(&pipeline).unwrap();
        let mut registry = PluginRegistry::new();
        registry.register("sleepy", Arc::new(SleepsForever) as Arc<dyn Plugin>).unwrap();
        let executor = Executor::new(Arc::new(registry));
        let ctx = RunContext::root(Duration::from_secs(5), 2);
        let options = RunOptions::from_settings(&pipeline.settings);
        let (results, _) = executor.apply(&pipeline, &plan, &ctx, &options, &Callbacks::default()).await;
        let by_id: HashMap<&str, &StepResult> = results.iter().map(|r| (r.step_id.as_str(), r)).collect();
        assert_eq!(by_id["slow"].status, StepStatus::Failed);
        assert_eq!(by_id["fast"].status, StepStatus::Success);
    }
}
