// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pipeline aggregate: settings plus an ordered list of steps.

use crate::step::Step;
use serde::{Deserialize, Serialize};

/// Execution settings attached to a pipeline, overridable per verify/apply
/// call through `RunOptions` in `streamy-core`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,
    #[serde(default = "default_timeout_seconds")]
    pub default_timeout_seconds: u64,
    #[serde(default)]
    pub continue_on_error: bool,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub verbose: bool,
}

fn default_max_parallelism() -> usize {
    4
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_parallelism: default_max_parallelism(),
            default_timeout_seconds: default_timeout_seconds(),
            continue_on_error: false,
            dry_run: false,
            verbose: false,
        }
    }
}

/// Simple predicate evaluated over the resulting system state, outside the
/// main step graph. The core treats these as opaque: only the name and the
/// raw predicate expression are kept, interpretation is an external concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRunValidation {
    pub name: String,
    pub expression: String,
}

/// A declared set of steps plus the settings governing how they run.
///
/// Created by the config loader (`streamy_core::config::load_pipeline`) and
/// consumed read-only by the planner and executor: nothing in `streamy-core`
/// mutates a `Pipeline` after it has been planned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: PipelineSettings,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub validations: Vec<PostRunValidation>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            settings: PipelineSettings::default(),
            steps,
            validations: Vec::new(),
        }
    }

    /// Steps that participate in planning; disabled steps are excluded.
    pub fn enabled_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.enabled)
    }

    pub fn find_step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_spec_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.max_parallelism, 4);
        assert!(!settings.continue_on_error);
        assert!(!settings.dry_run);
    }

    #[test]
    fn enabled_steps_excludes_disabled() {
        let p = Pipeline::new(
            "p",
            vec![Step::new("a", "noop", "A"), Step::new("b", "noop", "B").disabled()],
        );
        let ids: Vec<&str> = p.enabled_steps().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }
}
