//! Resolving a sub-command to a package and running it.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::Settings;
use crate::error::{Result, SproutError};
use crate::package::{Installer, Package, PackageOptions};

use super::context::InvocationContext;
use super::runner::{runner_for, Executable, InvocationMessage};

/// A sub-command's package, located and ready to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginDescriptor {
    pub command: String,
    pub package: String,
    /// Resolved version; `None` for a local override.
    pub version: Option<String>,
    /// Directory holding the package.
    pub root: PathBuf,
    /// Entry file declared by the package manifest.
    pub entry: PathBuf,
}

/// Runs sub-commands that live in their own packages.
pub struct CommandDispatcher {
    settings: Settings,
    executable: Box<dyn Executable>,
    installer: Option<Arc<dyn Installer>>,
}

impl CommandDispatcher {
    pub fn new(settings: Settings) -> Self {
        let executable = runner_for(settings.execution, &settings.runtime);
        Self {
            settings,
            executable,
            installer: None,
        }
    }

    /// Run entries with a different executable.
    pub fn with_executable(mut self, executable: Box<dyn Executable>) -> Self {
        self.executable = executable;
        self
    }

    /// Install packages with a different installer.
    pub fn with_installer(mut self, installer: Arc<dyn Installer>) -> Self {
        self.installer = Some(installer);
        self
    }

    /// Package name configured for `command`.
    pub fn package_name(&self, command: &str) -> Result<&str> {
        self.settings
            .package_for(command)
            .ok_or_else(|| SproutError::UnknownCommand {
                name: command.to_string(),
            })
    }

    /// The cache entry for `command`.
    ///
    /// A target path override makes it an unversioned package at that path;
    /// otherwise it is the latest version under the dependency store.
    pub fn package(&self, command: &str) -> Result<Package> {
        let name = self.package_name(command)?;
        let options = match &self.settings.target_path {
            Some(path) => PackageOptions::local(name, path, &self.settings.registry),
            None => PackageOptions::latest(
                name,
                &self.settings.dependencies_dir(),
                &self.settings.dependencies_store(),
                &self.settings.registry,
            ),
        };
        debug!(
            "targetPath {}, storeDir {:?}",
            options.target_path.display(),
            options.store_dir
        );

        let package = Package::new(options)?;
        Ok(match &self.installer {
            Some(installer) => package.with_installer(Arc::clone(installer)),
            None => package,
        })
    }

    /// Make sure `command`'s package is present and find its entry.
    pub fn resolve(&self, command: &str) -> Result<PluginDescriptor> {
        let mut package = self.package(command)?;
        if package.is_versioned() {
            package.fetch_or_update()?;
        }

        let root = package.install_dir()?;
        let entry = package
            .entry_file_path()?
            .ok_or_else(|| SproutError::EntryNotFound {
                package: package.name().to_string(),
                path: root.clone(),
            })?;

        Ok(PluginDescriptor {
            command: command.to_string(),
            package: package.name().to_string(),
            version: package.resolved_version().map(String::from),
            root,
            entry,
        })
    }

    /// Resolve `command` and run it with `raw_args`, returning its exit code.
    pub fn dispatch(&self, command: &str, raw_args: &[String]) -> Result<i32> {
        let plugin = self.resolve(command)?;
        debug!("Dispatching {} to {}", command, plugin.entry.display());

        let context = InvocationContext::from_raw_args(command, raw_args);
        let message =
            InvocationMessage::new(&plugin.entry, context.to_value()).with_argv(raw_args.to_vec());
        self.executable.run(&message)
    }
}
