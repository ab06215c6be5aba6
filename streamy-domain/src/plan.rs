// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Execution plan: a levelised, deterministic ordering of step IDs.
//!
//! Construction lives in `streamy_core::planner`; this module only holds the
//! resulting value and the invariant checks the planner depends on, so that
//! `streamy-domain` has no dependency on the planning algorithm itself.

use crate::error::StreamyError;
use crate::pipeline::Pipeline;
use std::collections::HashSet;

/// A maximal antichain of the dependency graph: step IDs that may run
/// concurrently because none depends on another.
pub type Level = Vec<String>;

/// Topologically levelised sequence of step sets derived from a pipeline.
///
/// Invariants upheld by the planner: every enabled step appears in exactly
/// one level; every dependency of a step in level *k* resides in some level
/// *<k*; levels are stored in increasing order; within a level, IDs are
/// sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub levels: Vec<Level>,
}

impl ExecutionPlan {
    pub fn empty() -> Self {
        Self { levels: Vec::new() }
    }

    pub fn step_count(&self) -> usize {
        self.levels.iter().map(|l| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Sorts step IDs ascending by codepoint, as required for deterministic
/// scheduling within a level.
pub fn sort_level(mut ids: Vec<String>) -> Level {
    ids.sort();
    ids
}

/// Validates a pipeline's static shape before planning: unique non-empty IDs,
/// dependencies that point at enabled steps, and non-empty type tags.
pub fn validate_pipeline(pipeline: &Pipeline) -> Result<(), StreamyError> {
    let mut seen = HashSet::new();
    for step in &pipeline.steps {
        if step.id.is_empty() {
            return Err(StreamyError::Validation("step id must not be empty".to_string()));
        }
        if !seen.insert(step.id.as_str()) {
            return Err(StreamyError::Duplicate(step.id.clone()));
        }
        if step.type_tag.is_empty() {
            return Err(StreamyError::Validation(format!("step '{}' has an empty type tag", step.id)));
        }
    }

    let enabled: HashSet<&str> = pipeline.enabled_steps().map(|s| s.id.as_str()).collect();
    for step in pipeline.enabled_steps() {
        for dep in &step.depends_on {
            if !enabled.contains(dep.as_str()) {
                return Err(StreamyError::MissingDependency(format!(
                    "step '{}' depends on '{}' which is missing or disabled",
                    step.id, dep
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Step;

    #[test]
    fn sort_level_orders_ascending() {
        let sorted = sort_level(vec!["c".into(), "a".into(), "b".into()]);
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let pipeline = Pipeline::new("p", vec![Step::new("a", "noop", "A"), Step::new("a", "noop", "A2")]);
        let err = validate_pipeline(&pipeline).unwrap_err();
        assert_eq!(err.code(), "duplicate");
    }

    #[test]
    fn validate_rejects_missing_dependency() {
        let pipeline = Pipeline::new("p", vec![Step::new("a", "noop", "A").with_dependency("ghost")]);
        let err = validate_pipeline(&pipeline).unwrap_err();
        assert_eq!(err.code(), "missing_dependency");
    }

    #[test]
    fn validate_rejects_dependency_on_disabled_step() {
        let pipeline = Pipeline::new(
            "p",
            vec![Step::new("a", "noop", "A").disabled(), Step::new("b", "noop", "B").with_dependency("a")],
        );
        let err = validate_pipeline(&pipeline).unwrap_err();
        assert_eq!(err.code(), "missing_dependency");
    }

    #[test]
    fn validate_rejects_empty_type_tag() {
        let pipeline = Pipeline::new("p", vec![Step::new("a", "", "A")]);
        let err = validate_pipeline(&pipeline).unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn validate_accepts_well_formed_pipeline() {
        let pipeline = Pipeline::new("p", vec![Step::new("a", "noop", "A"), Step::new("b", "noop", "B").with_dependency("a")]);
        assert!(validate_pipeline(&pipeline).is_ok());
    }
}
