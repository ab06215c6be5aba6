// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process-local mapping from step-type tag to plugin.

use crate::plugin::{Plugin, PluginMetadata};
use std::collections::HashMap;
use std::sync::Arc;
use streamy_domain::StreamyError;

/// Lookup table from step-type tag to a registered plugin.
///
/// Registration happens once at startup; lookup is hot and safe for
/// concurrent readers since the registry is handed out as `Arc<PluginRegistry>`
/// and never mutated after construction.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
    insertion_order: Vec<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a plugin to its type tag. Fails with `plugin_duplicate` if the
    /// tag is already bound.
    pub fn register(&mut self, tag: impl Into<String>, plugin: Arc<dyn Plugin>) -> Result<(), StreamyError> {
        let tag = tag.into();
        if self.plugins.contains_key(&tag) {
            return Err(StreamyError::PluginDuplicate(tag));
        }
        self.insertion_order.push(tag.clone());
        self.plugins.insert(tag, plugin);
        Ok(())
    }

    /// Resolves a plugin by type tag. Fails with `plugin_missing` otherwise.
    pub fn get(&self, tag: &str) -> Result<Arc<dyn Plugin>, StreamyError> {
        self.plugins.get(tag).cloned().ok_or_else(|| StreamyError::PluginMissing(tag.to_string()))
    }

    /// Enumerates registered plugin metadata in insertion order.
    pub fn list(&self) -> Vec<PluginMetadata> {
        self.insertion_order
            .iter()
            .filter_map(|tag| self.plugins.get(tag))
            .map(|p| p.metadata())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::RunContext;
    use async_trait::async_trait;
    use streamy_domain::{EvaluationResult, Step, StepResult};

    struct StubPlugin(&'static str);

    #[async_trait]
    impl Plugin for StubPlugin {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new(self.0, "0.1.0", self.0)
        }

        async fn evaluate(&self, _ctx: &RunContext, step: &Step) -> Result<EvaluationResult, StreamyError> {
            Ok(EvaluationResult::satisfied(&step.id, "stub"))
        }

        async fn apply(&self, _ctx: &RunContext, _prior: &EvaluationResult, step: &Step) -> Result<StepResult, StreamyError> {
            Ok(StepResult::new(&step.id, streamy_domain::StepStatus::Success, "stub", std::time::Duration::ZERO))
        }
    }

    #[test]
    fn register_then_get_round_trips() {
        let mut registry = PluginRegistry::new();
        registry.register("noop", Arc::new(StubPlugin("noop"))).unwrap();
        assert!(registry.get("noop").is_ok());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = PluginRegistry::new();
        registry.register("noop", Arc::new(StubPlugin("noop"))).unwrap();
        let err = registry.register("noop", Arc::new(StubPlugin("noop"))).unwrap_err();
        assert_eq!(err.code(), "plugin_duplicate");
    }

    #[test]
    fn missing_lookup_fails() {
        let registry = PluginRegistry::new();
        let err = registry.get("ghost").unwrap_err();
        assert_eq!(err.code(), "plugin_missing");
    }

    #[test]
    fn list_preserves_insertion_order() {
        let mut registry = PluginRegistry::new();
        registry.register("b", Arc::new(StubPlugin("b"))).unwrap();
        registry.register("a", Arc::new(StubPlugin("a"))).unwrap();
        let tags: Vec<String> = registry.list().into_iter().map(|m| m.type_tag).collect();
        assert_eq!(tags, vec!["b", "a"]);
    }
}
