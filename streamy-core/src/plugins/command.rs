// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shell-command plugin: evaluate runs a read-only probe, apply runs a
//! mutating command. Grounded in the "read-only commands" allowance of the
//! plugin contract.

use crate::cancel::RunContext;
use crate::plugin::{Plugin, PluginMetadata};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use streamy_domain::{EvaluationResult, Step, StepResult, StepStatus, StreamyError, Verdict};

#[derive(Debug, Deserialize)]
struct CommandPayload {
    probe_command: String,
    #[serde(default)]
    probe_args: Vec<String>,
    #[serde(default)]
    expected_exit_code: i32,
    #[serde(default)]
    expected_stdout: Option<String>,
    apply_command: String,
    #[serde(default)]
    apply_args: Vec<String>,
}

pub struct CommandPlugin;

impl CommandPlugin {
    fn payload(step: &Step) -> Result<CommandPayload, StreamyError> {
        serde_json::from_value(step.payload.clone())
            .map_err(|e| StreamyError::Validation(format!("step '{}' has an invalid command payload: {e}", step.id)))
    }
}

#[async_trait]
impl Plugin for CommandPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("command", env!("CARGO_PKG_VERSION"), "command")
    }

    async fn evaluate(&self, _ctx: &RunContext, step: &Step) -> Result<EvaluationResult, StreamyError> {
        let payload = Self::payload(step)?;
        let output = tokio::process::Command::new(&payload.probe_command)
            .args(&payload.probe_args)
            .output()
            .await
            .map_err(|e| StreamyError::Execution(format!("failed to run probe command: {e}")))?;

        let exit_matches = output.status.code().unwrap_or(-1) == payload.expected_exit_code;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stdout_matches = match payload.expected_stdout.as_deref() {
            Some(expected) => expected == stdout,
            None => true,
        };

        if exit_matches && stdout_matches {
            Ok(EvaluationResult::satisfied(&step.id, "probe command matched expected state"))
        } else {
            Ok(EvaluationResult::new(&step.id, Verdict::Drifted, format!("probe command reported '{stdout}'")))
        }
    }

    async fn apply(&self, _ctx: &RunContext, _prior_evaluation: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError> {
        let payload = Self::payload(step)?;
        let start = Instant::now();
        let status = tokio::process::Command::new(&payload.apply_command)
            .args(&payload.apply_args)
            .status()
            .await
            .map_err(|e| StreamyError::Execution(format!("failed to run apply command: {e}")))?;

        if status.success() {
            Ok(StepResult::new(&step.id, StepStatus::Success, "apply command succeeded", start.elapsed()))
        } else {
            Ok(StepResult::new(
                &step.id,
                StepStatus::Failed,
                format!("apply command exited with {status}"),
                start.elapsed(),
            )
            .with_changed(false))
        }
    }
}
