//! Verify command implementation

use std::path::Path;

use colored::Colorize;
use repo_core::{IndexEngine, VerifyStatus};
use serde_json::json;

use super::load_config;
use crate::error::{CliError, Result};

/// Run the verify command
///
/// Fails when the index is not healthy so scripts can rely on the exit code.
pub fn run_verify(config_path: &Path, as_json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = IndexEngine::from_config(&config)?;

    if !as_json {
        println!("{} Verifying published index...", "=>".blue().bold());
    }
    let report = engine.verify()?;
    let status = report.status();

    if as_json {
        let mut value = serde_json::to_value(&report)?;
        value["status"] = json!(status);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match status {
            VerifyStatus::Healthy => {
                println!(
                    "{} Index is healthy. {} documents checked.",
                    "OK".green().bold(),
                    report.checked
                );
            }
            VerifyStatus::Missing | VerifyStatus::Corrupt => {
                let label = if status == VerifyStatus::Missing {
                    "MISSING".yellow().bold()
                } else {
                    "CORRUPT".red().bold()
                };
                println!("{} {} documents checked:", label, report.checked);
                for name in &report.missing {
                    println!("   {} {} (missing)", "-".yellow(), name.cyan());
                }
                for name in &report.mismatched {
                    println!("   {} {} (hash mismatch)", "!".red(), name.cyan());
                }
                for name in &report.invalid {
                    println!("   {} {} (invalid)", "!".red(), name.cyan());
                }
                println!();
                println!("Run {} to republish.", "repoctl generate".cyan());
            }
        }
    }

    if report.is_healthy() {
        Ok(())
    } else {
        Err(CliError::user(format!("index is {status}")))
    }
}
