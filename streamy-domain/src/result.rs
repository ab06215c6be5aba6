// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Per-step results and the aggregated summaries built from them.

use crate::error::ErrorDetail;
use crate::status::{PipelineStatus, SkipReason, StepStatus, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Result of a non-mutating `evaluate` call for one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub step_id: String,
    pub verdict: Verdict,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl EvaluationResult {
    pub fn satisfied(step_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            verdict: Verdict::Satisfied,
            message: message.into(),
            details: None,
            error: None,
        }
    }

    pub fn new(step_id: impl Into<String>, verdict: Verdict, message: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            verdict,
            message: message.into(),
            details: None,
            error: None,
        }
    }

    pub fn with_details(mut self, details: HashMap<String, Value>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Result of an `apply` run for one step, as serialized in the JSON result
/// schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub status: StepStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    /// Whether the step transitioned the system to a new state this run.
    /// `false` for `already_satisfied` and `would_*`, per the design note.
    pub changed: bool,
    pub timestamp: DateTime<Utc>,
    /// Set only when `status` is `Skipped`; why the step was never run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
}

impl StepResult {
    pub fn new(step_id: impl Into<String>, status: StepStatus, message: impl Into<String>, duration: Duration) -> Self {
        let changed = matches!(status, StepStatus::Success);
        Self {
            step_id: step_id.into(),
            status,
            message: message.into(),
            details: None,
            error: None,
            duration,
            changed,
            timestamp: Utc::now(),
            skip_reason: None,
        }
    }

    /// A `Skipped` result carrying the structured reason it was never run.
    pub fn skipped(step_id: impl Into<String>, reason: SkipReason, duration: Duration) -> Self {
        let message = match reason {
            SkipReason::Cancelled => "skipped: cancelled",
            SkipReason::DependencyFailed => "skipped: dependency_failed",
        };
        Self {
            skip_reason: Some(reason),
            ..Self::new(step_id, StepStatus::Skipped, message, duration)
        }
    }

    pub fn with_error(mut self, error: ErrorDetail) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_changed(mut self, changed: bool) -> Self {
        self.changed = changed;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

/// Aggregated counts over the five evaluation verdicts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub total_steps: usize,
    pub satisfied: usize,
    pub missing: usize,
    pub drifted: usize,
    pub blocked: usize,
    pub unknown: usize,
    pub duration_seconds: f64,
}

/// Summary + per-step entries produced by verify or apply, returned by value
/// from the façade and optionally persisted as a cached status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub config_file: String,
    pub summary: VerdictCounts,
    pub summary_message: String,
    pub status: PipelineStatus,
    pub failed_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}
