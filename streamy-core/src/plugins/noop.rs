// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Always-satisfied plugin, grounded in `PassThroughService`.

use crate::cancel::RunContext;
use crate::plugin::{Plugin, PluginMetadata};
use async_trait::async_trait;
use std::time::Duration;
use streamy_domain::{EvaluationResult, Step, StepResult, StepStatus, StreamyError};

pub struct NoopPlugin;

#[async_trait]
impl Plugin for NoopPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("noop", env!("CARGO_PKG_VERSION"), "noop")
    }

    async fn evaluate(&self, _ctx: &RunContext, step: &Step) -> Result<EvaluationResult, StreamyError> {
        Ok(EvaluationResult::satisfied(&step.id, "no-op step is always satisfied"))
    }

    async fn apply(&self, _ctx: &RunContext, _prior_evaluation: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError> {
        Ok(StepResult::new(&step.id, StepStatus::AlreadySatisfied, "no-op step performs no action", Duration::ZERO).with_changed(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamy_domain::Verdict;

    #[tokio::test]
    async fn evaluate_is_always_satisfied() {
        let plugin = NoopPlugin;
        let step = Step::new("a", "noop", "A");
        let ctx = RunContext::root(Duration::from_secs(1), 1);
        let result = plugin.evaluate(&ctx, &step).await.unwrap();
        assert_eq!(result.verdict, Verdict::Satisfied);
    }
}
