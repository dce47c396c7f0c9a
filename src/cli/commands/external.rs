//! Sub-commands served by command packages.
//!
//! `sprout publish --dry-run` looks up the package mapped to `publish`,
//! fetches or reuses it, and hands it the remaining arguments.

use tracing::debug;

use crate::config::Settings;
use crate::dispatch::CommandDispatcher;
use crate::error::{Result, SproutError};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// A command that is not built into sprout.
pub struct ExternalCommand {
    settings: Settings,
    argv: Vec<String>,
}

impl ExternalCommand {
    /// `argv[0]` is the command name, the rest are its arguments.
    pub fn new(settings: &Settings, argv: Vec<String>) -> Self {
        Self {
            settings: settings.clone(),
            argv,
        }
    }
}

impl Command for ExternalCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let (name, args) = self
            .argv
            .split_first()
            .ok_or_else(|| SproutError::UnknownCommand {
                name: String::new(),
            })?;

        let dispatcher = CommandDispatcher::new(self.settings.clone());
        let package = dispatcher.package_name(name)?;
        debug!("Command {} maps to {}", name, package);

        let code = dispatcher.dispatch(name, args)?;
        if code != 0 {
            ui.error(&format!("{} exited with code {}", name, code));
        }
        Ok(CommandResult::from_exit_code(code))
    }
}
