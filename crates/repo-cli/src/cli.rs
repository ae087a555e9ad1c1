//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Build and maintain a static Composer repository index
#[derive(Parser, Debug)]
#[command(name = "repoctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, global = true, env = "REPO_CONFIG", default_value = "repo.yml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Rebuild the whole index from every configured source
    Generate {
        /// Generate into memory and print the root document instead of publishing
        #[arg(long)]
        dry_run: bool,
    },

    /// Refresh individual packages in the published index
    Update {
        /// Packages to refresh, as <source>:<package>
        #[arg(required = true, value_name = "SOURCE:PACKAGE")]
        packages: Vec<String>,
    },

    /// Check every document reachable from the published root
    Verify {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_update_with_global_config() {
        let cli = Cli::try_parse_from([
            "repoctl",
            "update",
            "gitlab:acme/widget",
            "local:acme/gadget",
            "--config",
            "ci/repo.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("ci/repo.toml"));
        assert_eq!(
            cli.command,
            Commands::Update {
                packages: vec!["gitlab:acme/widget".into(), "local:acme/gadget".into()]
            }
        );
    }

    #[test]
    fn test_update_requires_a_package() {
        assert!(Cli::try_parse_from(["repoctl", "update"]).is_err());
    }

    #[test]
    fn test_generate_dry_run_flag() {
        let cli = Cli::try_parse_from(["repoctl", "-v", "generate", "--dry-run"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.command, Commands::Generate { dry_run: true });
    }
}
