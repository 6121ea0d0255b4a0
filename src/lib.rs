pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod report;
pub mod runtime;

#[cfg(test)]
pub mod test_utils;

pub use cli::{Cli, Command};
pub use config::{CacheConfig, DetectionConfig};
pub use error::{InputRole, PipelineError, Result};
pub use pipeline::{Orchestrator, OutputLayout, PipelineVariant, RunState, StageSpec};
pub use report::{RunReport, StageReport};
pub use runtime::{RuntimeBackend, RuntimeResolver};
