// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Command-line surface, grounded in `bootstrap/src/cli/parser.rs`'s
//! clap-derive `Cli`/`Commands` shape.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "streamy", version, about = "Declarative environment configuration")]
pub struct Cli {
    /// Emit debug-level logs.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Emit machine-readable JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check whether a pipeline's declared steps already match the system.
    Verify {
        config: PathBuf,
        #[arg(long)]
        continue_on_error: bool,
        #[arg(long, value_parser = parse_seconds)]
        timeout: Option<std::time::Duration>,
    },
    /// Reconcile drift by running each step's apply operation.
    Apply {
        config: PathBuf,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        continue_on_error: bool,
        #[arg(long, value_parser = parse_seconds)]
        timeout: Option<std::time::Duration>,
    },
    /// Re-verify a registered pipeline and refresh its cached status.
    Refresh {
        pipeline_id: Option<String>,
    },
    /// Manage the local pipeline registry.
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum RegistryAction {
    Add {
        id: String,
        path: PathBuf,
        #[arg(long, default_value = "")]
        description: String,
    },
    List,
    Show {
        id: String,
    },
    Remove {
        id: String,
    },
}

fn parse_seconds(raw: &str) -> Result<std::time::Duration, String> {
    raw.parse::<u64>().map(std::time::Duration::from_secs).map_err(|e| e.to_string())
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
