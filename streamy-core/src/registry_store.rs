// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistent pipeline registry and status cache, backed by two flat JSON
//! files under a user-level state directory.
//!
//! Read and written only by `streamy-cli`'s `registry`/`refresh` commands;
//! the façade itself never touches these files. Writes go through a
//! temp-file-then-rename so a crash mid-write never leaves a truncated file
//! behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use streamy_domain::StreamyError;

const REGISTRY_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: String,
    pub name: String,
    pub path: String,
    pub description: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRegistry {
    pub version: u32,
    pub pipelines: Vec<RegistryEntry>,
}

impl Default for PipelineRegistry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            pipelines: Vec::new(),
        }
    }
}

impl PipelineRegistry {
    pub fn load(path: &Path) -> Result<Self, StreamyError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(StreamyError::from)
    }

    pub fn save(&self, path: &Path) -> Result<(), StreamyError> {
        write_atomically(path, &serde_json::to_string_pretty(self)?)
    }

    pub fn add(&mut self, entry: RegistryEntry) -> Result<(), StreamyError> {
        if self.pipelines.iter().any(|p| p.id == entry.id) {
            return Err(StreamyError::Duplicate(entry.id));
        }
        self.pipelines.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<(), StreamyError> {
        let before = self.pipelines.len();
        self.pipelines.retain(|p| p.id != id);
        if self.pipelines.len() == before {
            return Err(StreamyError::Validation(format!("no registered pipeline with id '{id}'")));
        }
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<&RegistryEntry> {
        self.pipelines.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedStatus {
    pub status: String,
    pub last_run: DateTime<Utc>,
    pub summary: String,
    pub step_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCache {
    pub version: u32,
    pub statuses: HashMap<String, CachedStatus>,
}

impl Default for StatusCache {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            statuses: HashMap::new(),
        }
    }
}

impl StatusCache {
    pub fn load(path: &Path) -> Result<Self, StreamyError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(StreamyError::from)
    }

    pub fn save(&self, path: &Path) -> Result<(), StreamyError> {
        write_atomically(path, &serde_json::to_string_pretty(self)?)
    }

    pub fn set(&mut self, pipeline_id: impl Into<String>, status: CachedStatus) {
        self.statuses.insert(pipeline_id.into(), status);
    }
}

/// Writes `contents` to `path` via a sibling temp file plus an atomic
/// rename, so readers never observe a partial write.
fn write_atomically(path: &Path, contents: &str) -> Result<(), StreamyError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path).map_err(|e| StreamyError::Io(e.to_string()))?;
    Ok(())
}
