//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CliDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::Result;
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output and prompts
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result mirroring a child's exit code.
    pub fn from_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            Self::success()
        } else {
            Self::failure(exit_code)
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CliDispatcher {
    settings: Settings,
    working_dir: PathBuf,
}

impl CliDispatcher {
    /// Create a new dispatcher working in `working_dir`.
    pub fn new(settings: Settings, working_dir: PathBuf) -> Self {
        Self {
            settings,
            working_dir,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Directory `init` creates projects in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Commands::Init(args) => {
                let cmd = super::init::InitCommand::new(
                    &self.settings,
                    &self.working_dir,
                    args.clone(),
                );
                cmd.execute(ui)
            }
            Commands::Cache(args) => {
                let cmd = super::cache::CacheCommand::new(&self.settings, args.clone());
                cmd.execute(ui)
            }
            Commands::External(argv) => {
                let cmd = super::external::ExternalCommand::new(&self.settings, argv.clone());
                cmd.execute(ui)
            }
        }
    }
}
