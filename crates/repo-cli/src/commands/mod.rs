//! Command implementations for repoctl

pub mod generate;
pub mod update;
pub mod verify;

pub use generate::run_generate;
pub use update::run_update;
pub use verify::run_verify;

use std::path::Path;

use repo_fs::NormalizedPath;
use repo_meta::{Config, OutputConfig};

use crate::error::Result;

/// Load and validate the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    tracing::debug!("Loading configuration from {}", path.display());
    Ok(repo_meta::load_config(&NormalizedPath::new(path))?)
}

/// URL prefix the configured output publishes under.
pub fn published_base_path(output: &OutputConfig) -> String {
    match output {
        OutputConfig::File(file) => file.base_path.clone(),
        OutputConfig::Azure(azure) => format!("/{}", azure.container),
        OutputConfig::Memory(memory) => memory.base_path.clone(),
    }
}
