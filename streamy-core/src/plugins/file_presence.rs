// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Path-presence plugin: evaluate checks existence (and optional contents),
//! apply creates/writes the file. Grounded in `file_io_service.rs`'s
//! path-oriented operations.

use crate::cancel::RunContext;
use crate::plugin::{Plugin, PluginMetadata};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use streamy_domain::{EvaluationResult, Step, StepResult, StepStatus, StreamyError, Verdict};

#[derive(Debug, Deserialize)]
struct FilePayload {
    path: String,
    #[serde(default)]
    contents: Option<String>,
}

pub struct FilePresencePlugin;

impl FilePresencePlugin {
    fn payload(step: &Step) -> Result<FilePayload, StreamyError> {
        serde_json::from_value(step.payload.clone())
            .map_err(|e| StreamyError::Validation(format!("step '{}' has an invalid file payload: {e}", step.id)))
    }
}

#[async_trait]
impl Plugin for FilePresencePlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("file_presence", env!("CARGO_PKG_VERSION"), "file_presence")
    }

    async fn evaluate(&self, _ctx: &RunContext, step: &Step) -> Result<EvaluationResult, StreamyError> {
        let payload = Self::payload(step)?;
        let path = std::path::Path::new(&payload.path);

        if !path.exists() {
            return Ok(EvaluationResult::new(&step.id, Verdict::Missing, format!("{} does not exist", payload.path)));
        }

        if let Some(expected) = &payload.contents {
            match tokio::fs::read_to_string(path).await {
                Ok(actual) if &actual == expected => Ok(EvaluationResult::satisfied(&step.id, "contents match")),
                Ok(_) => Ok(EvaluationResult::new(&step.id, Verdict::Drifted, format!("{} has unexpected contents", payload.path))),
                Err(e) => Ok(EvaluationResult::new(&step.id, Verdict::Blocked, format!("could not read {}: {e}", payload.path))),
            }
        } else {
            Ok(EvaluationResult::satisfied(&step.id, "path exists"))
        }
    }

    async fn apply(&self, _ctx: &RunContext, _prior_evaluation: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError> {
        let payload = Self::payload(step)?;
        let start = Instant::now();
        let path = std::path::Path::new(&payload.path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, payload.contents.unwrap_or_default()).await?;

        Ok(StepResult::new(&step.id, StepStatus::Success, format!("wrote {}", payload.path), start.elapsed()))
    }
}
