// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Step descriptor: the unit of declared desired state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable descriptor of a single declared unit of desired state.
///
/// A `Step` is constructed once by the config loader and never mutated
/// afterwards; the planner and executor both hold shared references into the
/// owning [`crate::pipeline::Pipeline`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique, non-empty identifier within the owning pipeline.
    pub id: String,
    /// Resolves to a plugin in the registry.
    pub type_tag: String,
    /// Human-readable label, not required to be unique.
    pub name: String,
    /// IDs of steps that must reach a terminal result before this one runs.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Disabled steps are excluded from planning entirely.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Per-step evaluate/apply timeout override, in seconds on the wire.
    #[serde(default, with = "duration_secs_opt", rename = "timeout_seconds")]
    pub timeout: Option<Duration>,
    /// Opaque, type-specific payload interpreted only by the resolved plugin.
    #[serde(default)]
    pub payload: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

impl Step {
    pub fn new(id: impl Into<String>, type_tag: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            name: name.into(),
            depends_on: Vec::new(),
            enabled: true,
            timeout: None,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        self.depends_on.push(dep.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<u64> = Option::deserialize(d)?;
        Ok(secs.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_spec() {
        let step = Step::new("a", "noop", "A step");
        assert!(step.enabled);
        assert!(step.depends_on.is_empty());
        assert!(step.timeout.is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let step = Step::new("a", "noop", "A step")
            .with_dependency("b")
            .with_timeout(Duration::from_secs(5));
        let json = serde_json::to_string(&step).unwrap();
        let back: Step = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "a");
        assert_eq!(back.depends_on, vec!["b".to_string()]);
        assert_eq!(back.timeout, Some(Duration::from_secs(5)));
    }
}
