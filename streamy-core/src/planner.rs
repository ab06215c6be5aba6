// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! DAG construction: validates steps and groups them into levels.

use std::collections::{HashMap, HashSet, VecDeque};
use streamy_domain::{sort_level, validate_pipeline, ExecutionPlan, Pipeline, StreamyError};

/// Builds an execution plan from a pipeline's enabled steps.
///
/// Runs [`validate_pipeline`] first, then Kahn's algorithm: an edge goes from
/// dependency to dependent, the frontier of in-degree-zero nodes is emitted
/// as the next level in ascending-ID order, and successors' in-degrees are
/// decremented. Nodes left with a positive in-degree after the frontier is
/// exhausted form a cycle.
pub fn build_plan(pipeline: &Pipeline) -> Result<ExecutionPlan, StreamyError> {
    validate_pipeline(pipeline)?;

    let enabled: Vec<&str> = pipeline.enabled_steps().map(|s| s.id.as_str()).collect();
    if enabled.is_empty() {
        return Ok(ExecutionPlan::empty());
    }

    let mut in_degree: HashMap<&str, usize> = enabled.iter().map(|id| (*id, 0)).collect();
    let mut successors: HashMap<&str, Vec<&str>> = enabled.iter().map(|id| (*id, Vec::new())).collect();

    for step in pipeline.enabled_steps() {
        for dep in &step.depends_on {
            *in_degree.get_mut(step.id.as_str()).expect("validated above") += 1;
            successors.get_mut(dep.as_str()).expect("validated above").push(step.id.as_str());
        }
    }

    let mut remaining = in_degree.clone();
    let mut levels = Vec::new();
    let mut queue: VecDeque<&str> = remaining
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut frontier: Vec<&str> = queue.drain(..).collect();
    while !frontier.is_empty() {
        let level = sort_level(frontier.iter().map(|s| s.to_string()).collect());
        let mut next_frontier = Vec::new();
        for id in &frontier {
            remaining.remove(id);
            for succ in successors.get(id).into_iter().flatten() {
                let degree = in_degree.get_mut(succ).expect("successor must be tracked");
                *degree -= 1;
                if *degree == 0 && remaining.contains_key(succ) {
                    next_frontier.push(*succ);
                }
            }
        }
        levels.push(level);
        frontier = next_frontier;
    }

    if !remaining.is_empty() {
        let mut cycle_ids: Vec<String> = remaining.keys().map(|s| s.to_string()).collect();
        cycle_ids.sort();
        return Err(StreamyError::Cycle(cycle_ids));
    }

    Ok(ExecutionPlan { levels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamy_domain::Step;

    #[test]
    fn empty_pipeline_yields_zero_levels() {
        let pipeline = Pipeline::new("p", Vec::new());
        let plan = build_plan(&pipeline).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn linear_chain_produces_one_step_per_level() {
        let pipeline = Pipeline::new(
            "p",
            vec![Step::new("a", "noop", "A"), Step::new("b", "noop", "B").with_dependency("a")],
        );
        let plan = build_plan(&pipeline).unwrap();
        assert_eq!(plan.levels, vec![vec!["a".to_string()], vec!["b".to_string()]]);
    }

    #[test]
    fn independent_steps_share_a_level() {
        let pipeline = Pipeline::new("p", vec![Step::new("a", "noop", "A"), Step::new("b", "noop", "B")]);
        let plan = build_plan(&pipeline).unwrap();
        assert_eq!(plan.levels, vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[test]
    fn cycle_is_detected_and_names_participants() {
        let pipeline = Pipeline::new(
            "p",
            vec![
                Step::new("x", "noop", "X").with_dependency("y"),
                Step::new("y", "noop", "Y").with_dependency("x"),
            ],
        );
        let err = build_plan(&pipeline).unwrap_err();
        assert_eq!(err.code(), "cycle");
        match err {
            StreamyError::Cycle(ids) => assert_eq!(ids, vec!["x".to_string(), "y".to_string()]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn plan_is_deterministic_across_runs() {
        let pipeline = Pipeline::new(
            "p",
            vec![
                Step::new("c", "noop", "C").with_dependency("a"),
                Step::new("a", "noop", "A"),
                Step::new("b", "noop", "B").with_dependency("a"),
            ],
        );
        let first = build_plan(&pipeline).unwrap();
        let second = build_plan(&pipeline).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.levels[0], vec!["a".to_string()]);
        assert_eq!(first.levels[1], vec!["b".to_string(), "c".to_string()]);
    }
}
