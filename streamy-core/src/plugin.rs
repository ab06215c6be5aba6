// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Plugin contract: the two-operation interface every step type implements.

use crate::cancel::RunContext;
use async_trait::async_trait;
use streamy_domain::{EvaluationResult, Step, StepResult, StreamyError};

/// Pure, side-effect-free description of a plugin, used for diagnostics and
/// `registry list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    pub type_tag: String,
    pub deps: Vec<String>,
}

impl PluginMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            type_tag: type_tag.into(),
            deps: Vec::new(),
        }
    }
}

/// Implementation of a step type, exposing `evaluate` and `apply`.
///
/// `evaluate` MUST NOT mutate system state; it may read files, run read-only
/// commands, or query package managers. `apply` MAY mutate, and receives the
/// prior evaluation so it can avoid re-probing when the executor has already
/// determined a verdict. Implementations are expected to be reentrant and
/// thread-safe: the executor invokes plugins concurrently across distinct
/// steps and never serialises unrelated work.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn metadata(&self) -> PluginMetadata;

    async fn evaluate(&self, ctx: &RunContext, step: &Step) -> Result<EvaluationResult, StreamyError>;

    async fn apply(&self, ctx: &RunContext, prior_evaluation: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError>;
}
