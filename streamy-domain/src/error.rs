// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! Hierarchical error type for the Streamy pipeline engine. Every failure
//! that can occur while planning, executing, or aggregating a pipeline run
//! is represented here so callers can match on a stable `code()` rather than
//! on message text.
//!
//! ## Error Categories
//!
//! - **Config/plan-time**: `ParseError`, `Validation`, `Duplicate`,
//!   `MissingDependency`, `Cycle`, `PluginDuplicate`, `PluginMissing`
//! - **Run-time, per-step**: `Timeout`, `Execution`, `DependencyFailed`
//! - **Run-time, whole-call**: `Cancelled`
//! - **Ambient**: `Io`, `Internal`
//!
//! Per-step errors are captured in a `StepResult`/`EvaluationResult` and
//! never abort neighbours. Only the whole-call variants (`Cancelled`, plan
//! rejection) short-circuit a `verify`/`apply` call.

use thiserror::Error;

/// Domain-specific errors for the pipeline execution engine.
#[derive(Error, Debug, Clone)]
pub enum StreamyError {
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("invalid pipeline configuration: {0}")]
    Validation(String),

    #[error("duplicate step id: {0}")]
    Duplicate(String),

    #[error("missing or disabled dependency: {0}")]
    MissingDependency(String),

    #[error("dependency cycle detected, participating steps: {0:?}")]
    Cycle(Vec<String>),

    #[error("plugin already registered for type tag: {0}")]
    PluginDuplicate(String),

    #[error("no plugin registered for type tag: {0}")]
    PluginMissing(String),

    #[error("step exceeded its deadline: {0}")]
    Timeout(String),

    #[error("run cancelled: {0}")]
    Cancelled(String),

    #[error("plugin execution failed: {0}")]
    Execution(String),

    #[error("skipped because a dependency failed: {0}")]
    DependencyFailed(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StreamyError {
    /// Stable, lowercase machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            StreamyError::ParseError(_) => "parse_error",
            StreamyError::Validation(_) => "validation",
            StreamyError::Duplicate(_) => "duplicate",
            StreamyError::MissingDependency(_) => "missing_dependency",
            StreamyError::Cycle(_) => "cycle",
            StreamyError::PluginDuplicate(_) => "plugin_duplicate",
            StreamyError::PluginMissing(_) => "plugin_missing",
            StreamyError::Timeout(_) => "timeout",
            StreamyError::Cancelled(_) => "cancelled",
            StreamyError::Execution(_) => "execution",
            StreamyError::DependencyFailed(_) => "dependency_failed",
            StreamyError::Io(_) => "io",
            StreamyError::Internal(_) => "internal",
        }
    }

    /// Whether a caller might reasonably retry the operation that produced
    /// this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StreamyError::Timeout(_) | StreamyError::Io(_))
    }

    /// The CLI exit code this error maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            StreamyError::ParseError(_)
            | StreamyError::Validation(_)
            | StreamyError::Duplicate(_)
            | StreamyError::MissingDependency(_)
            | StreamyError::Cycle(_)
            | StreamyError::PluginDuplicate(_)
            | StreamyError::PluginMissing(_) => 2,
            StreamyError::Cancelled(_) => 3,
            StreamyError::Io(_) | StreamyError::Internal(_) => 3,
            StreamyError::Timeout(_) | StreamyError::Execution(_) | StreamyError::DependencyFailed(_) => 1,
        }
    }
}

impl From<std::io::Error> for StreamyError {
    fn from(err: std::io::Error) -> Self {
        StreamyError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StreamyError {
    fn from(err: serde_json::Error) -> Self {
        StreamyError::ParseError(err.to_string())
    }
}

/// Structured, user-facing error detail surfaced by the façade.
///
/// The façade wraps a short-circuiting `StreamyError` in this shape so the
/// CLI can render actionable diagnostics while programmatic callers still
/// get the typed error via `source`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub context: Option<String>,
    pub suggestion: Option<String>,
}

impl ErrorDetail {
    pub fn from_error(err: &StreamyError) -> Self {
        let suggestion = match err {
            StreamyError::Cycle(_) => Some("break the cycle by removing or reordering a dependency".to_string()),
            StreamyError::MissingDependency(_) => {
                Some("check that the referenced step id exists and is enabled".to_string())
            }
            StreamyError::PluginMissing(_) => Some("register a plugin for this type tag before planning".to_string()),
            _ => None,
        };
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            context: None,
            suggestion,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
