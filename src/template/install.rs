//! Installing a cached template into the project directory.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::dispatch::{Executable, InvocationMessage, SubprocessRunner};
use crate::error::{Result, SproutError};
use crate::package::{copy_dir_all, Package};
use crate::shell::{split_command_line, CommandOptions, ProcessRunner, SystemRunner};
use crate::ui::{with_spinner, UserInterface};

use super::descriptor::{TemplateInfo, TemplateKind};
use super::project::ProjectInfo;
use super::render::render_dir;

/// Programs a template's install and start commands may run.
pub const ALLOWED_COMMANDS: &[&str] = &["npm", "cnpm"];

/// Directory inside a template package that holds the project files.
pub const TEMPLATE_SUBDIR: &str = "template";

/// Split a command line and check its program against [`ALLOWED_COMMANDS`].
///
/// Blank lines yield `None`.
///
/// # Errors
/// Returns [`SproutError::UnauthorizedCommand`] for any other program.
pub fn check_command(line: &str) -> Result<Option<(String, Vec<String>)>> {
    let mut tokens = split_command_line(line);
    if tokens.is_empty() {
        return Ok(None);
    }
    let program = tokens.remove(0);

    if !ALLOWED_COMMANDS.contains(&program.as_str()) {
        return Err(SproutError::UnauthorizedCommand {
            command: program,
            allowed: ALLOWED_COMMANDS.join(", "),
        });
    }
    Ok(Some((program, tokens)))
}

/// Installs one template for one project.
pub struct TemplateInstaller {
    template: TemplateInfo,
    project: ProjectInfo,
    package: Package,
    target_dir: PathBuf,
    process: Arc<dyn ProcessRunner>,
    executable: Box<dyn Executable>,
}

impl TemplateInstaller {
    /// `package` is the template's cache entry; `target_dir` is where the
    /// project is created.
    pub fn new(
        template: TemplateInfo,
        project: ProjectInfo,
        package: Package,
        target_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template,
            project,
            package,
            target_dir: target_dir.into(),
            process: Arc::new(SystemRunner),
            executable: Box::new(SubprocessRunner::default()),
        }
    }

    /// Runner for the install and start commands.
    pub fn with_process_runner(mut self, process: Arc<dyn ProcessRunner>) -> Self {
        self.process = process;
        self
    }

    /// Runner for a custom template's entry.
    pub fn with_executable(mut self, executable: Box<dyn Executable>) -> Self {
        self.executable = executable;
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Install according to the template's kind.
    pub fn install(&mut self, ui: &mut dyn UserInterface) -> Result<()> {
        debug!(
            "Installing {} template {}",
            match self.template.kind {
                TemplateKind::Normal => "normal",
                TemplateKind::Custom => "custom",
            },
            self.template.npm_name
        );
        match self.template.kind {
            TemplateKind::Normal => self.install_normal(ui),
            TemplateKind::Custom => self.install_custom(),
        }
    }

    /// Copy and render the template files, then run its commands.
    ///
    /// Files already copied and rendered stay on disk when a command fails.
    pub fn install_normal(&self, ui: &mut dyn UserInterface) -> Result<()> {
        let source = self.source_dir()?;
        let changed = with_spinner(ui, "Installing template...", "Template installed", || {
            fs::create_dir_all(&source)?;
            fs::create_dir_all(&self.target_dir)?;
            copy_dir_all(&source, &self.target_dir)?;
            render_dir(
                &self.target_dir,
                &self.template.ignore,
                &self.project.render_context(),
            )
        })?;
        debug!("Rendered {} files", changed.len());

        self.run_command(self.template.install_command.as_deref())?;
        self.run_command(self.template.start_command.as_deref())?;
        Ok(())
    }

    /// Hand the project over to the template's own installer entry.
    pub fn install_custom(&mut self) -> Result<()> {
        if !self.package.exists()? {
            return Err(SproutError::TemplateNotCached {
                package: self.template.npm_name.clone(),
            });
        }

        let entry = self
            .package
            .entry_file_path()?
            .filter(|p| p.is_file())
            .ok_or_else(|| SproutError::CustomEntryMissing {
                package: self.template.npm_name.clone(),
            })?;

        let payload = json!({
            "templateInfo": self.template,
            "projectInfo": self.project,
            "sourcePath": self.source_dir()?,
            "targetPath": self.target_dir,
        });
        info!("Running custom template installer");
        let code = self
            .executable
            .run(&InvocationMessage::new(&entry, payload))?;

        if code != 0 {
            return Err(SproutError::ChildFailure {
                command: entry.display().to_string(),
                code: Some(code),
            });
        }
        Ok(())
    }

    fn source_dir(&self) -> Result<PathBuf> {
        Ok(self.package.install_dir()?.join(TEMPLATE_SUBDIR))
    }

    fn run_command(&self, line: Option<&str>) -> Result<()> {
        let Some((program, args)) = line.map(check_command).transpose()?.flatten() else {
            return Ok(());
        };

        info!("Running {} {}", program, args.join(" "));
        let code = self.process.run(
            &program,
            &args,
            &CommandOptions::in_dir(&self.target_dir),
        )?;
        if code != Some(0) {
            return Err(SproutError::ChildFailure {
                command: format!("{} {}", program, args.join(" ")),
                code,
            });
        }
        Ok(())
    }
}
