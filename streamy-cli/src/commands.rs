// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Verb handlers: each wires the façade, the registry/status store, and
//! output rendering for one CLI subcommand.

use crate::cli::{Commands, RegistryAction};
use crate::exit_code::ExitCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use streamy_core::facade::CallOptions;
use streamy_core::registry_store::{CachedStatus, PipelineRegistry, RegistryEntry, StatusCache};
use streamy_core::{PipelineService, PluginRegistry};
use streamy_domain::StreamyError;

fn state_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".streamy")
}

fn registry_path() -> PathBuf {
    state_dir().join("registry.json")
}

fn status_cache_path() -> PathBuf {
    state_dir().join("status.json")
}

fn built_in_registry() -> Arc<PluginRegistry> {
    let mut registry = PluginRegistry::new();
    registry.register("noop", Arc::new(streamy_core::plugins::NoopPlugin)).expect("built-in tags are unique");
    registry.register("command", Arc::new(streamy_core::plugins::CommandPlugin)).expect("built-in tags are unique");
    registry
        .register("file_presence", Arc::new(streamy_core::plugins::FilePresencePlugin))
        .expect("built-in tags are unique");
    Arc::new(registry)
}

fn print_record(record: &streamy_domain::ExecutionRecord, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(record).expect("ExecutionRecord always serializes"));
    } else {
        println!("{}: {}", record.config_file, record.summary_message);
    }
}

/// Prints a verify/apply record and derives the exit code. When the run was
/// cancelled or hit its total deadline, `record.error` is set alongside
/// whatever steps did complete; the JSON form already carries it, and the
/// plain form gets an extra line so it isn't silently dropped.
fn report_run(record: &streamy_domain::ExecutionRecord, json: bool) -> ExitCode {
    print_record(record, json);
    if !json {
        if let Some(error) = &record.error {
            eprintln!("error: {}", error.message);
        }
    }
    ExitCode::from_pipeline_status(record.status)
}

pub async fn run(cli: crate::cli::Cli) -> ExitCode {
    let exit = match cli.command {
        Commands::Verify { config, continue_on_error, timeout } => run_verify(&config, continue_on_error, timeout, cli.json).await,
        Commands::Apply { config, dry_run, continue_on_error, timeout } => run_apply(&config, dry_run, continue_on_error, timeout, cli.json).await,
        Commands::Refresh { pipeline_id } => run_refresh(pipeline_id, cli.json).await,
        Commands::Registry { action } => run_registry(action),
    };
    if exit == ExitCode::Success {
        tracing::info!(exit_code = exit.code(), "command finished");
    } else {
        tracing::warn!(exit_code = exit.code(), %exit, "command finished with a non-zero exit code");
    }
    exit
}

async fn run_verify(config: &Path, continue_on_error: bool, timeout: Option<std::time::Duration>, json: bool) -> ExitCode {
    let service = PipelineService::new(built_in_registry());
    let options = CallOptions {
        per_step_timeout: timeout,
        verbose: false,
        dry_run: false,
        continue_on_error: Some(continue_on_error),
    };
    match service.verify(config, options).await {
        Ok((_, _, record)) => report_run(&record, json),
        Err(err) => report_error(&err, json),
    }
}

async fn run_apply(config: &Path, dry_run: bool, continue_on_error: bool, timeout: Option<std::time::Duration>, json: bool) -> ExitCode {
    let service = PipelineService::new(built_in_registry());
    let options = CallOptions {
        per_step_timeout: timeout,
        verbose: false,
        dry_run,
        continue_on_error: Some(continue_on_error),
    };
    match service.apply(config, options).await {
        Ok((_, _, record)) => report_run(&record, json),
        Err(err) => report_error(&err, json),
    }
}

async fn run_refresh(pipeline_id: Option<String>, json: bool) -> ExitCode {
    run_refresh_at(&registry_path(), &status_cache_path(), pipeline_id, json).await
}

async fn run_refresh_at(registry_path: &Path, status_cache_path: &Path, pipeline_id: Option<String>, json: bool) -> ExitCode {
    let registry = match PipelineRegistry::load(registry_path) {
        Ok(r) => r,
        Err(err) => return report_error(&err, json),
    };

    let targets: Vec<&RegistryEntry> = match &pipeline_id {
        Some(id) => match registry.find(id) {
            Some(entry) => vec![entry],
            None => return report_error(&StreamyError::Validation(format!("no registered pipeline with id '{id}'")), json),
        },
        None => registry.pipelines.iter().collect(),
    };

    let mut cache = StatusCache::load(status_cache_path).unwrap_or_default();
    let service = PipelineService::new(built_in_registry());
    let mut worst = ExitCode::Success;

    for entry in targets {
        match service.verify(Path::new(&entry.path), CallOptions::default()).await {
            Ok((_, _, record)) => {
                let exit = ExitCode::from_pipeline_status(record.status);
                if exit.code() > worst.code() {
                    worst = exit;
                }
                cache.set(
                    entry.id.clone(),
                    CachedStatus {
                        status: record.status.as_wire_str().to_string(),
                        last_run: chrono::Utc::now(),
                        summary: record.summary_message.clone(),
                        step_count: record.summary.total_steps,
                        failed_steps: record.failed_steps.clone(),
                    },
                );
                print_record(&record, json);
                if !json {
                    if let Some(error) = &record.error {
                        eprintln!("{}: error: {}", entry.id, error.message);
                    }
                }
            }
            Err(err) => {
                worst = ExitCode::from_error(&err);
                eprintln!("{}: {err}", entry.id);
            }
        }
    }

    if let Err(err) = cache.save(status_cache_path) {
        return report_error(&err, json);
    }
    worst
}

fn run_registry(action: RegistryAction) -> ExitCode {
    run_registry_at(&registry_path(), action)
}

fn run_registry_at(path: &Path, action: RegistryAction) -> ExitCode {
    let mut registry = match PipelineRegistry::load(path) {
        Ok(r) => r,
        Err(err) => return report_error(&err, false),
    };

    let result = match action {
        RegistryAction::Add { id, path: pipeline_path, description } => registry.add(RegistryEntry {
            id,
            name: pipeline_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default(),
            path: pipeline_path.display().to_string(),
            description,
            registered_at: chrono::Utc::now(),
        }),
        RegistryAction::Remove { id } => registry.remove(&id),
        RegistryAction::List => {
            for entry in &registry.pipelines {
                println!("{}\t{}\t{}", entry.id, entry.name, entry.path);
            }
            Ok(())
        }
        RegistryAction::Show { id } => match registry.find(&id) {
            Some(entry) => {
                println!("{}", serde_json::to_string_pretty(entry).expect("RegistryEntry always serializes"));
                Ok(())
            }
            None => Err(StreamyError::Validation(format!("no registered pipeline with id '{id}'"))),
        },
    };

    match result {
        Ok(()) => match registry.save(path) {
            Ok(()) => ExitCode::Success,
            Err(err) => report_error(&err, false),
        },
        Err(err) => report_error(&err, false),
    }
}

fn report_error(err: &StreamyError, json: bool) -> ExitCode {
    let detail = streamy_domain::ErrorDetail::from_error(err);
    if json {
        println!("{}", serde_json::to_string_pretty(&detail).expect("ErrorDetail always serializes"));
    } else {
        eprintln!("error: {}", detail.message);
        if let Some(suggestion) = &detail.suggestion {
            eprintln!("suggestion: {suggestion}");
        }
    }
    ExitCode::from_error(err)
}
