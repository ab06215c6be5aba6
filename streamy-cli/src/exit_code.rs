// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process exit codes for the four outcomes the façade actually
//! distinguishes: full success, drift or failure, bad configuration, and
//! internal error.

use std::fmt;
use streamy_domain::{PipelineStatus, StreamyError};

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// All satisfied (verify) or apply success.
    Success = 0,
    /// Drift detected (verify) or apply failure.
    DriftOrFailure = 1,
    /// Configuration error: parse or validation failure.
    ConfigError = 2,
    /// Internal or execution error.
    Internal = 3,
}

impl ExitCode {
    pub fn from_error(err: &StreamyError) -> Self {
        match err.exit_code() {
            2 => ExitCode::ConfigError,
            1 => ExitCode::DriftOrFailure,
            _ => ExitCode::Internal,
        }
    }

    pub fn from_pipeline_status(status: PipelineStatus) -> Self {
        match status {
            PipelineStatus::Satisfied => ExitCode::Success,
            PipelineStatus::Drifted | PipelineStatus::Failed => ExitCode::DriftOrFailure,
            PipelineStatus::Unknown => ExitCode::Internal,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "all satisfied or apply succeeded",
            ExitCode::DriftOrFailure => "drift detected or apply failure",
            ExitCode::ConfigError => "configuration parse or validation error",
            ExitCode::Internal => "internal or execution error",
        }
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.description())
    }
}
