// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Status and verdict enums, with their canonical lowercase wire form.

use serde::{Deserialize, Serialize};

/// Outcome of a non-mutating `evaluate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The step need not run; system already matches desired state.
    Satisfied,
    /// Desired state is entirely absent from the system.
    Missing,
    /// Desired state is present but differs from what is declared.
    Drifted,
    /// The plugin could not determine state (e.g. permission denied).
    Blocked,
    /// The executor assigned this because the step was never evaluated.
    Unknown,
}

impl Verdict {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Verdict::Satisfied => "satisfied",
            Verdict::Missing => "missing",
            Verdict::Drifted => "drifted",
            Verdict::Blocked => "blocked",
            Verdict::Unknown => "unknown",
        }
    }

    /// Verdicts, other than `blocked`, meaning apply would change state.
    pub fn is_drift(&self) -> bool {
        matches!(self, Verdict::Missing | Verdict::Drifted)
    }
}

/// Terminal outcome of an `apply` run for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    Skipped,
    /// Dry-run only: the step would have created new state.
    WouldCreate,
    /// Dry-run only: the step would have updated existing state.
    WouldUpdate,
    /// The step was already satisfied and `apply` was not called.
    AlreadySatisfied,
}

impl StepStatus {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::WouldCreate => "would_create",
            StepStatus::WouldUpdate => "would_update",
            StepStatus::AlreadySatisfied => "already_satisfied",
        }
    }

    /// `would_*` and `already_satisfied` count as success for aggregation.
    pub fn counts_as_success(&self) -> bool {
        matches!(
            self,
            StepStatus::Success | StepStatus::WouldCreate | StepStatus::WouldUpdate | StepStatus::AlreadySatisfied
        )
    }
}

/// Why a step was skipped rather than executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Cancelled,
    DependencyFailed,
}

/// Overall pipeline status derived by the aggregator's precedence cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Failed,
    Drifted,
    Satisfied,
    Unknown,
}

impl PipelineStatus {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            PipelineStatus::Failed => "failed",
            PipelineStatus::Drifted => "drifted",
            PipelineStatus::Satisfied => "satisfied",
            PipelineStatus::Unknown => "unknown",
        }
    }
}
