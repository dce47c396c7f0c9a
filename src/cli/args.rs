//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::TARGET_PATH_ENV;

/// Sprout - Project scaffolding and on-demand commands.
#[derive(Debug, Parser)]
#[command(name = "sprout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use the package at this path instead of fetching sub-commands
    #[arg(long, global = true, env = TARGET_PATH_ENV, value_name = "PATH")]
    pub target_path: Option<PathBuf>,

    /// Skip the check for a newer sprout release
    #[arg(long, global = true)]
    pub no_update_check: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a project or component from a template
    Init(InitArgs),

    /// Inspect the package cache
    Cache(CacheArgs),

    /// Any other command is looked up in the configured command packages
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Arguments for the `init` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InitArgs {
    /// Project name (prompted for when missing or invalid)
    pub name: Option<String>,

    /// Empty a non-empty directory after confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Template package to use instead of choosing one
    #[arg(short, long, value_name = "NPM_NAME")]
    pub template: Option<String>,
}

/// Arguments for the `cache` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

/// Cache subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum CacheSubcommand {
    /// Print where a package is (or would be) cached
    Path {
        /// Package name
        name: String,

        /// Version to compute the path for (defaults to the latest release)
        #[arg(long)]
        version: Option<String>,

        /// Compute the path inside the template store
        #[arg(long)]
        template: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_init_with_name() {
        let cli = Cli::try_parse_from(["sprout", "init", "my-app", "--force"]).unwrap();
        match cli.command {
            Commands::Init(args) => {
                assert_eq!(args.name.as_deref(), Some("my-app"));
                assert!(args.force);
                assert!(args.template.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn unknown_commands_are_external() {
        let cli =
            Cli::try_parse_from(["sprout", "publish", "--dry-run", "-x", "target"]).unwrap();
        match cli.command {
            Commands::External(args) => {
                assert_eq!(args, vec!["publish", "--dry-run", "-x", "target"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_before_command() {
        let cli = Cli::try_parse_from([
            "sprout",
            "--debug",
            "--no-update-check",
            "--target-path",
            "/tmp/pkg",
            "publish",
        ])
        .unwrap();
        assert!(cli.debug);
        assert!(cli.no_update_check);
        assert_eq!(cli.target_path, Some(PathBuf::from("/tmp/pkg")));
    }

    #[test]
    fn cache_path_version() {
        let cli =
            Cli::try_parse_from(["sprout", "cache", "path", "foo", "--version", "1.2.3"]).unwrap();
        match cli.command {
            Commands::Cache(CacheArgs {
                command:
                    CacheSubcommand::Path {
                        name,
                        version,
                        template,
                    },
            }) => {
                assert_eq!(name, "foo");
                assert_eq!(version.as_deref(), Some("1.2.3"));
                assert!(!template);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
