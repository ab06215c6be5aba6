// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Folds per-step results into a pipeline summary and execution record.
//!
//! Both verify (evaluation verdicts) and apply (step statuses) are folded
//! through the same five-bucket vocabulary (`satisfied`/`missing`/`drifted`/
//! `blocked`/`unknown`) so the JSON summary schema is identical across modes.
//! For apply, `failed` steps are counted in the `blocked` bucket and
//! `skipped` steps in the `unknown` bucket, matching the semantics that
//! `unknown` is reserved for steps that were never evaluated and `blocked`
//! means "needs attention" outside of verify mode.

use std::time::Duration;
use streamy_domain::{EvaluationResult, ExecutionRecord, PipelineStatus, StepResult, StepStatus, Verdict, VerdictCounts};

/// Which of the five aggregation buckets a step result falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Satisfied,
    Missing,
    Drifted,
    Blocked,
    Unknown,
}

fn bucket_for_verdict(v: Verdict) -> Bucket {
    match v {
        Verdict::Satisfied => Bucket::Satisfied,
        Verdict::Missing => Bucket::Missing,
        Verdict::Drifted => Bucket::Drifted,
        Verdict::Blocked => Bucket::Blocked,
        Verdict::Unknown => Bucket::Unknown,
    }
}

fn bucket_for_step_status(s: StepStatus) -> Bucket {
    match s {
        StepStatus::Success | StepStatus::AlreadySatisfied => Bucket::Satisfied,
        StepStatus::WouldCreate => Bucket::Missing,
        StepStatus::WouldUpdate => Bucket::Drifted,
        StepStatus::Failed => Bucket::Blocked,
        StepStatus::Skipped => Bucket::Unknown,
    }
}

struct Tally {
    counts: VerdictCounts,
    failed_steps: Vec<String>,
    seen: std::collections::HashSet<String>,
}

impl Tally {
    fn new() -> Self {
        Self {
            counts: VerdictCounts::default(),
            failed_steps: Vec::new(),
            seen: std::collections::HashSet::new(),
        }
    }

    fn record(&mut self, step_id: &str, bucket: Bucket) {
        self.counts.total_steps += 1;
        match bucket {
            Bucket::Satisfied => self.counts.satisfied += 1,
            Bucket::Missing => self.counts.missing += 1,
            Bucket::Drifted => self.counts.drifted += 1,
            Bucket::Blocked => self.counts.blocked += 1,
            Bucket::Unknown => self.counts.unknown += 1,
        }
        if !matches!(bucket, Bucket::Satisfied) && self.seen.insert(step_id.to_string()) {
            self.failed_steps.push(step_id.to_string());
        }
    }
}

fn status_from_tally(tally: &Tally, is_verify: bool) -> PipelineStatus {
    let counts = &tally.counts;
    let has_failed = counts.blocked > 0 && !is_verify;
    let has_drift = counts.missing > 0 || counts.drifted > 0;
    let all_satisfied = counts.total_steps > 0 && counts.satisfied == counts.total_steps;

    if has_failed {
        PipelineStatus::Failed
    } else if has_drift {
        PipelineStatus::Drifted
    } else if all_satisfied {
        PipelineStatus::Satisfied
    } else {
        // Covers an empty plan, all-unknown outcomes, and verify-mode
        // blocked steps with no drift or failure: undetermined state.
        PipelineStatus::Unknown
    }
}

fn summary_message(status: PipelineStatus, tally: &Tally) -> String {
    let counts = &tally.counts;
    match status {
        PipelineStatus::Satisfied => format!("All {} steps passed", counts.total_steps),
        PipelineStatus::Drifted => format!("{} steps need changes", counts.missing + counts.drifted),
        PipelineStatus::Failed => {
            if counts.unknown > 0 {
                format!("{} steps failed or unknown", tally.failed_steps.len())
            } else {
                format!("{} steps failed", tally.failed_steps.len())
            }
        }
        PipelineStatus::Unknown => format!("{} steps failed or unknown", tally.failed_steps.len()),
    }
}

/// Aggregates evaluation results from a verify run into an execution record.
pub fn aggregate_verification(config_file: impl Into<String>, results: &[EvaluationResult], duration: Duration) -> ExecutionRecord {
    let mut tally = Tally::new();
    for r in results {
        tally.record(&r.step_id, bucket_for_verdict(r.verdict));
    }
    tally.counts.duration_seconds = duration.as_secs_f64();
    let status = status_from_tally(&tally, true);
    let summary_message = summary_message(status, &tally);
    ExecutionRecord {
        config_file: config_file.into(),
        summary: tally.counts,
        summary_message,
        status,
        failed_steps: tally.failed_steps,
        error: None,
    }
}

/// Aggregates step results from an apply run into an execution record.
pub fn aggregate_apply(config_file: impl Into<String>, results: &[StepResult], duration: Duration) -> ExecutionRecord {
    let mut tally = Tally::new();
    for r in results {
        tally.record(&r.step_id, bucket_for_step_status(r.status));
    }
    tally.counts.duration_seconds = duration.as_secs_f64();
    let status = status_from_tally(&tally, false);
    let summary_message = summary_message(status, &tally);
    ExecutionRecord {
        config_file: config_file.into(),
        summary: tally.counts,
        summary_message,
        status,
        failed_steps: tally.failed_steps,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_satisfied_verify_yields_satisfied_status() {
        let results = vec![
            EvaluationResult::satisfied("a", "ok"),
            EvaluationResult::satisfied("b", "ok"),
        ];
        let record = aggregate_verification("p.yaml", &results, Duration::from_secs(1));
        assert_eq!(record.status, PipelineStatus::Satisfied);
        assert_eq!(record.summary_message, "All 2 steps passed");
        assert!(record.failed_steps.is_empty());
    }

    #[test]
    fn missing_evaluation_yields_drifted_status() {
        let results = vec![EvaluationResult::new("f", Verdict::Missing, "missing")];
        let record = aggregate_verification("p.yaml", &results, Duration::from_secs(1));
        assert_eq!(record.status, PipelineStatus::Drifted);
        assert_eq!(record.failed_steps, vec!["f".to_string()]);
    }

    #[test]
    fn failed_step_in_apply_yields_failed_status() {
        let results = vec![
            StepResult::new("a", StepStatus::Failed, "boom", Duration::from_millis(5)),
            StepResult::new("b", StepStatus::Skipped, "dependency failed", Duration::ZERO),
        ];
        let record = aggregate_apply("p.yaml", &results, Duration::from_secs(1));
        assert_eq!(record.status, PipelineStatus::Failed);
        assert_eq!(record.failed_steps, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn zero_step_plan_yields_unknown_status() {
        let record = aggregate_verification("p.yaml", &[], Duration::ZERO);
        assert_eq!(record.status, PipelineStatus::Unknown);
    }

    proptest::proptest! {
        #[test]
        fn status_precedence_holds_for_random_apply_mixes(
            statuses in proptest::collection::vec(
                proptest::sample::select(vec![
                    StepStatus::Success,
                    StepStatus::Failed,
                    StepStatus::Skipped,
                    StepStatus::WouldCreate,
                    StepStatus::WouldUpdate,
                    StepStatus::AlreadySatisfied,
                ]),
                1..12,
            )
        ) {
            let results: Vec<StepResult> = statuses
                .iter()
                .enumerate()
                .map(|(i, s)| StepResult::new(format!("s{i}"), *s, "x", Duration::ZERO))
                .collect();
            let record = aggregate_apply("p.yaml", &results, Duration::ZERO);

            let any_failed = statuses.iter().any(|s| matches!(s, StepStatus::Failed));
            let any_drift = statuses.iter().any(|s| matches!(s, StepStatus::WouldCreate | StepStatus::WouldUpdate));
            let all_satisfied = statuses.iter().all(|s| matches!(s, StepStatus::Success | StepStatus::AlreadySatisfied));

            if any_failed {
                proptest::prop_assert_eq!(record.status, PipelineStatus::Failed);
            } else if any_drift {
                proptest::prop_assert_eq!(record.status, PipelineStatus::Drifted);
            } else if all_satisfied {
                proptest::prop_assert_eq!(record.status, PipelineStatus::Satisfied);
            }
        }
    }
}
