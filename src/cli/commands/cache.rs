//! Cache command implementation.
//!
//! Provides `sprout cache path <name>`.

use crate::cli::args::{CacheArgs, CacheSubcommand};
use crate::config::Settings;
use crate::error::{Result, SproutError};
use crate::package::{Package, PackageOptions};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The cache command implementation.
pub struct CacheCommand {
    settings: Settings,
    args: CacheArgs,
}

impl CacheCommand {
    /// Create a new cache command.
    pub fn new(settings: &Settings, args: CacheArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }
}

impl Command for CacheCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &self.args.command {
            CacheSubcommand::Path {
                name,
                version,
                template,
            } => {
                let path = cache_path(&self.settings, name, version.as_deref(), *template)?;
                ui.message(&path.display().to_string());
            }
        }
        Ok(CommandResult::success())
    }
}

/// Where `name` is cached, resolving the latest version only when the layout
/// needs one.
fn cache_path(
    settings: &Settings,
    name: &str,
    version: Option<&str>,
    template: bool,
) -> Result<std::path::PathBuf> {
    let (root, store) = if template {
        (settings.template_dir(), settings.template_store())
    } else {
        (settings.dependencies_dir(), settings.dependencies_store())
    };
    let mut package = Package::new(PackageOptions::latest(
        name,
        &root,
        &store,
        &settings.registry,
    ))?;

    if let Some(version) = version {
        return package.cache_file_path(Some(version));
    }
    match package.cache_file_path(None) {
        Err(SproutError::UnresolvedVersion { .. }) => {
            package.prepare()?;
            package.install_dir()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::CacheLayout;
    use crate::ui::MockUI;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn path_args(name: &str, version: Option<&str>, template: bool) -> CacheArgs {
        CacheArgs {
            command: CacheSubcommand::Path {
                name: name.to_string(),
                version: version.map(String::from),
                template,
            },
        }
    }

    #[test]
    fn explicit_version_needs_no_registry() {
        let home = TempDir::new().unwrap();
        let mut settings = Settings::for_home(home.path());
        settings.registry = "http://127.0.0.1:9".to_string();
        let mut ui = MockUI::new();

        let result = CacheCommand::new(&settings, path_args("@scope/tool", Some("1.2.3"), false))
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        let store = settings.dependencies_store();
        let expected = match CacheLayout::detect().unwrap() {
            CacheLayout::Compound => store.join("_@scope_tool@1.2.3@@scope/tool"),
            CacheLayout::Simple => store.join("@scope/tool"),
        };
        assert_eq!(ui.messages(), [expected.display().to_string()]);
    }

    #[test]
    fn template_store_is_separate() {
        let home = TempDir::new().unwrap();
        let settings = Settings::for_home(home.path());

        let path = cache_path(&settings, "tpl", Some("1.0.0"), true).unwrap();
        assert!(path.starts_with(settings.template_store()));
    }

    #[cfg(unix)]
    #[test]
    fn latest_is_resolved_from_registry() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/tool");
            then.status(200)
                .json_body(serde_json::json!({ "versions": { "1.0.0": {}, "1.3.0": {} } }));
        });
        let home = TempDir::new().unwrap();
        let mut settings = Settings::for_home(home.path());
        settings.registry = server.base_url();

        let path = cache_path(&settings, "tool", None, false).unwrap();
        assert_eq!(path, settings.dependencies_store().join("_tool@1.3.0@tool"));
    }
}
