//! Pipeline execution engine: planning, plugin registry, bounded-parallel
//! execution, and result aggregation, wired together behind a single
//! service façade.

pub mod aggregate;
pub mod cancel;
pub mod config;
pub mod correlation;
pub mod events;
pub mod executor;
pub mod facade;
pub mod metrics;
pub mod planner;
pub mod plugin;
pub mod plugins;
pub mod registry;
pub mod registry_store;

pub use cancel::{CancellationToken, RunContext};
pub use correlation::CorrelationId;
pub use executor::{Callbacks, Executor, RunOptions};
pub use facade::{CallOptions, PipelineService};
pub use plugin::{Plugin, PluginMetadata};
pub use planner::build_plan;
pub use registry::PluginRegistry;
