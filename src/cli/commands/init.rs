//! Init command implementation.
//!
//! The `sprout init` command creates a project or component in the current
//! directory from a template package.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::cli::args::InitArgs;
use crate::config::Settings;
use crate::error::{Result, SproutError};
use crate::package::{Installer, Package, PackageOptions};
use crate::shell::ProcessRunner;
use crate::template::{
    collect_project_info, fetch_template_list, TemplateInfo, TemplateInstaller,
};
use crate::ui::{with_spinner, Prompt, PromptType, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// Entries that don't make a directory count as occupied.
const IGNORED_ENTRIES: &[&str] = &["node_modules"];

/// The init command implementation.
pub struct InitCommand {
    settings: Settings,
    working_dir: PathBuf,
    args: InitArgs,
    installer: Option<Arc<dyn Installer>>,
    process: Option<Arc<dyn ProcessRunner>>,
}

impl InitCommand {
    /// Create a new init command.
    pub fn new(settings: &Settings, working_dir: &Path, args: InitArgs) -> Self {
        Self {
            settings: settings.clone(),
            working_dir: working_dir.to_path_buf(),
            args,
            installer: None,
            process: None,
        }
    }

    /// Install template packages with a different installer.
    pub fn with_installer(mut self, installer: Arc<dyn Installer>) -> Self {
        self.installer = Some(installer);
        self
    }

    /// Run the template's commands with a different runner.
    pub fn with_process_runner(mut self, process: Arc<dyn ProcessRunner>) -> Self {
        self.process = Some(process);
        self
    }

    /// Get the command arguments.
    pub fn args(&self) -> &InitArgs {
        &self.args
    }

    /// Make sure the working directory may be used.
    ///
    /// Returns `false` when the user declined to continue.
    fn prepare_directory(&self, ui: &mut dyn UserInterface) -> Result<bool> {
        fs::create_dir_all(&self.working_dir)?;
        if is_dir_empty(&self.working_dir)? {
            return Ok(true);
        }

        if !self.args.force {
            let proceed = ui
                .prompt(&Prompt {
                    key: "ifContinue".into(),
                    question: "The current directory is not empty. Continue creating the project?"
                        .into(),
                    prompt_type: PromptType::Confirm,
                    default: Some("false".into()),
                })?
                .as_bool();
            if !proceed {
                return Ok(false);
            }
        }

        let wipe = ui
            .prompt(&Prompt {
                key: "confirmDelete".into(),
                question: "Empty the current directory? Every file in it will be removed".into(),
                prompt_type: PromptType::Confirm,
                default: Some("false".into()),
            })?
            .as_bool();
        if wipe {
            debug!("Emptying {}", self.working_dir.display());
            empty_dir(&self.working_dir)?;
        }
        Ok(true)
    }

    /// Templates from the config file plus the remote list, if configured.
    fn template_list(&self, ui: &mut dyn UserInterface) -> Result<Vec<TemplateInfo>> {
        let mut templates = self.settings.templates.clone();
        if let Some(url) = &self.settings.template_list_url {
            let remote = with_spinner(ui, "Fetching template list...", "Template list loaded", || {
                fetch_template_list(url)
            })?;
            templates.extend(remote);
        }
        if templates.is_empty() {
            return Err(SproutError::NoTemplates);
        }
        Ok(templates)
    }

    /// Cache entry for `template` under the template store.
    fn template_package(&self, template: &TemplateInfo) -> Result<Package> {
        let package = Package::new(PackageOptions {
            name: template.npm_name.clone(),
            version: template.version.clone(),
            target_path: self.settings.template_dir(),
            store_dir: Some(self.settings.template_store()),
            registry: self.settings.registry.clone(),
        })?;
        Ok(match &self.installer {
            Some(installer) => package.with_installer(Arc::clone(installer)),
            None => package,
        })
    }
}

impl Command for InitCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if !self.prepare_directory(ui)? {
            ui.warning("Cancelled");
            return Ok(CommandResult::failure(1));
        }

        let templates = self.template_list(ui)?;
        let project = collect_project_info(
            ui,
            &templates,
            self.args.name.as_deref(),
            self.args.template.as_deref(),
        )?;
        debug!("Project info: {:?}", project);

        let template = templates
            .iter()
            .find(|t| t.npm_name == project.project_template)
            .cloned()
            .ok_or_else(|| SproutError::UnknownTemplate {
                name: project.project_template.clone(),
            })?;

        let mut package = self.template_package(&template)?;
        with_spinner(ui, "Downloading template...", "Template downloaded", || {
            package.fetch_or_update()
        })?;

        let project_name = project.project_name.clone();
        let mut installer = TemplateInstaller::new(template, project, package, &self.working_dir);
        if let Some(process) = &self.process {
            installer = installer.with_process_runner(Arc::clone(process));
        }
        installer.install(ui)?;

        ui.success(&format!(
            "Created {} in {}",
            project_name,
            self.working_dir.display()
        ));
        Ok(CommandResult::success())
    }
}

/// Whether `dir` holds nothing but dotfiles and ignored entries.
fn is_dir_empty(dir: &Path) -> Result<bool> {
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with('.') && !IGNORED_ENTRIES.contains(&name.as_ref()) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Remove everything inside `dir`, keeping `dir` itself.
fn empty_dir(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
