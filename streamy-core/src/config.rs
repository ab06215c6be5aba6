// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Loads a pipeline definition from a YAML configuration document.

use std::path::Path;
use streamy_domain::{validate_pipeline, Pipeline, StreamyError};

/// Parses `path` as YAML into a [`Pipeline`], then validates its static
/// shape. Malformed YAML surfaces as `parse_error`; a well-formed but
/// semantically invalid pipeline surfaces as `validation`.
pub fn load_pipeline(path: &Path) -> Result<Pipeline, StreamyError> {
    let contents = std::fs::read_to_string(path).map_err(|e| StreamyError::Io(format!("reading {}: {e}", path.display())))?;
    parse_pipeline(&contents)
}

/// Parses an in-memory YAML document, used by callers that already have the
/// document contents (e.g. tests, or a config fetched from elsewhere).
pub fn parse_pipeline(contents: &str) -> Result<Pipeline, StreamyError> {
    let pipeline: Pipeline = serde_yaml::from_str(contents).map_err(|e| StreamyError::ParseError(e.to_string()))?;
    validate_pipeline(&pipeline)?;
    Ok(pipeline)
}
