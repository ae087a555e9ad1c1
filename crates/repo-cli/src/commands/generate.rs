//! Generate command implementation

use std::path::Path;

use colored::Colorize;
use repo_core::{IndexEngine, MemoryStorage};

use super::{load_config, published_base_path};
use crate::error::Result;

/// Run the generate command
///
/// With `dry_run`, every source is still fetched but the index is built in
/// memory and only the root document is printed.
pub fn run_generate(config_path: &Path, dry_run: bool) -> Result<()> {
    let config = load_config(config_path)?;

    if dry_run {
        eprintln!(
            "{} Generating index in memory (dry run)...",
            "=>".blue().bold()
        );
        let storage = MemoryStorage::new(published_base_path(&config.output));
        let engine = IndexEngine::from_config_with_storage(&config, Box::new(storage))?;
        let report = engine.generate()?;

        println!("{}", serde_json::to_string_pretty(&report.root)?);
        eprintln!(
            "{} Would publish {} packages ({} versions, {} shards)",
            "DRY RUN".yellow().bold(),
            report.packages,
            report.versions,
            report.shards_written
        );
        return Ok(());
    }

    println!("{} Generating index...", "=>".blue().bold());
    let engine = IndexEngine::from_config(&config)?;
    let report = engine.generate()?;

    println!(
        "{} Published {} packages ({} versions, {} shards)",
        "OK".green().bold(),
        report.packages,
        report.versions,
        report.shards_written
    );
    Ok(())
}
