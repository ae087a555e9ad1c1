//! Update command implementation

use std::path::Path;

use colored::Colorize;
use repo_core::{IndexEngine, PackageRef};

use super::load_config;
use crate::error::Result;

/// Run the update command
///
/// Every argument is parsed before the configuration is loaded, so a typo
/// never reaches the network.
pub fn run_update(config_path: &Path, packages: &[String]) -> Result<()> {
    let requests = packages
        .iter()
        .map(|p| p.parse::<PackageRef>())
        .collect::<repo_core::Result<Vec<_>>>()?;

    let config = load_config(config_path)?;
    let engine = IndexEngine::from_config(&config)?;

    println!(
        "{} Updating {} package(s)...",
        "=>".blue().bold(),
        requests.len()
    );
    let report = engine.update(&requests)?;

    for package in &report.updated {
        println!("   {} {}", "+".green(), package.to_string().cyan());
    }
    for package in &report.removed {
        println!("   {} {} (removed)", "-".yellow(), package.to_string().cyan());
    }
    println!(
        "{} Index updated ({} shards written)",
        "OK".green().bold(),
        report.shards_written
    );
    Ok(())
}
