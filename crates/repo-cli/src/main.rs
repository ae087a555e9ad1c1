//! repoctl
//!
//! Generates, incrementally updates and verifies a static Composer
//! repository index from the sources declared in a configuration file.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Generate { dry_run } => commands::run_generate(&cli.config, dry_run),
        Commands::Update { packages } => commands::run_update(&cli.config, &packages),
        Commands::Verify { json } => commands::run_verify(&cli.config, json),
    }
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` overrides the
/// default level.
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {e}")))?;

    tracing::debug!("Verbose mode enabled");
    Ok(())
}
