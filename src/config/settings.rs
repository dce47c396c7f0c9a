//! Runtime settings.
//!
//! Settings come from three layers, later ones winning:
//! 1. Built-in defaults
//! 2. The user config file (`~/.sprout/config.yml`)
//! 3. Environment variables (`SPROUT_REGISTRY`)
//!
//! Environment variables may also be set in `~/.env`; the process
//! environment wins over that file. Command-line flags are applied on top by
//! the CLI.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatch::{ExecutionMode, DEFAULT_RUNTIME};
use crate::error::{Result, SproutError};
use crate::registry::{DEFAULT_REGISTRY, REGISTRY_ENV};
use crate::template::TemplateInfo;

/// CLI home directory name under the user home.
pub const DEFAULT_CLI_HOME: &str = ".sprout";

/// Environment variable renaming the CLI home directory.
pub const CLI_HOME_ENV: &str = "SPROUT_CLI_HOME";

/// Environment variable pointing sub-commands at a local package.
pub const TARGET_PATH_ENV: &str = "SPROUT_TARGET_PATH";

/// Dotenv file read from the user home.
pub const DOTENV_FILE: &str = ".env";

/// Config file name inside the CLI home.
pub const CONFIG_FILE: &str = "config.yml";

const DEPENDENCIES_DIR: &str = "dependencies";
const TEMPLATE_DIR: &str = "template";
const STORE_DIR: &str = "node_modules";
const UPDATE_CACHE_FILE: &str = "update_check.json";

/// The user config file as written on disk.
///
/// ```yaml
/// registry: https://registry.npmmirror.com
/// execution: inline
/// commands:
///   publish: "@sprout-cli/publish"
/// templates:
///   - name: Vue app
///     npmName: "@sprout-cli/template-vue"
///     installCommand: npm install
///     startCommand: npm run serve
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub registry: Option<String>,
    pub runtime: Option<String>,
    pub execution: Option<ExecutionMode>,
    pub commands: BTreeMap<String, String>,
    pub templates: Vec<TemplateInfo>,
    pub template_list_url: Option<String>,
    pub update_check: Option<bool>,
}

impl FileConfig {
    /// Parse a config file.
    ///
    /// # Errors
    /// Returns [`SproutError::ConfigParseError`] for malformed YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| SproutError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Everything the commands need to know about the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// The user's home directory.
    pub home: PathBuf,
    /// Sprout's own directory, `~/.sprout` by default.
    pub cli_home: PathBuf,
    /// Registry base URL.
    pub registry: String,
    /// Local package used instead of fetching sub-commands.
    pub target_path: Option<PathBuf>,
    /// Interpreter for script entries.
    pub runtime: String,
    pub execution: ExecutionMode,
    /// Sub-command name to package name.
    pub commands: BTreeMap<String, String>,
    pub templates: Vec<TemplateInfo>,
    pub template_list_url: Option<String>,
    pub update_check: bool,
}

impl Settings {
    /// Defaults for a user whose home is `home`.
    pub fn for_home(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            cli_home: home.join(DEFAULT_CLI_HOME),
            registry: DEFAULT_REGISTRY.to_string(),
            target_path: None,
            runtime: DEFAULT_RUNTIME.to_string(),
            execution: ExecutionMode::default(),
            commands: BTreeMap::new(),
            templates: Vec::new(),
            template_list_url: None,
            update_check: true,
        }
    }

    /// Load settings for the current user.
    ///
    /// # Errors
    /// Returns [`SproutError::HomeDirMissing`] when there is no home directory.
    pub fn load() -> Result<Self> {
        let home = dirs_next::home_dir().ok_or(SproutError::HomeDirMissing)?;
        load_settings(&home, |key| std::env::var(key).ok())
    }

    /// Apply a parsed config file.
    pub fn merge_file(&mut self, file: FileConfig) {
        if let Some(registry) = file.registry {
            self.registry = registry;
        }
        if let Some(runtime) = file.runtime {
            self.runtime = runtime;
        }
        if let Some(execution) = file.execution {
            self.execution = execution;
        }
        if let Some(update_check) = file.update_check {
            self.update_check = update_check;
        }
        self.commands.extend(file.commands);
        self.templates.extend(file.templates);
        self.template_list_url = file.template_list_url.or(self.template_list_url.take());
    }

    pub fn config_path(&self) -> PathBuf {
        self.cli_home.join(CONFIG_FILE)
    }

    /// Install root for sub-command packages.
    pub fn dependencies_dir(&self) -> PathBuf {
        self.cli_home.join(DEPENDENCIES_DIR)
    }

    /// Store directory for sub-command packages.
    pub fn dependencies_store(&self) -> PathBuf {
        self.dependencies_dir().join(STORE_DIR)
    }

    /// Install root for template packages.
    pub fn template_dir(&self) -> PathBuf {
        self.cli_home.join(TEMPLATE_DIR)
    }

    /// Store directory for template packages.
    pub fn template_store(&self) -> PathBuf {
        self.template_dir().join(STORE_DIR)
    }

    pub fn update_cache_path(&self) -> PathBuf {
        self.cli_home.join(UPDATE_CACHE_FILE)
    }

    /// Package configured for a sub-command.
    pub fn package_for(&self, command: &str) -> Option<&str> {
        self.commands.get(command).map(String::as_str)
    }
}

/// Build settings for `home`, reading environment values through `env`.
///
/// # Errors
/// Returns [`SproutError::HomeDirMissing`] when `home` does not exist and
/// [`SproutError::ConfigParseError`] for a malformed config file.
pub fn load_settings(home: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Settings> {
    if !home.is_dir() {
        return Err(SproutError::HomeDirMissing);
    }

    let dotenv = read_dotenv(&home.join(DOTENV_FILE))?;
    let env = |key: &str| env(key).or_else(|| dotenv.get(key).cloned());

    let mut settings = Settings::for_home(home);
    if let Some(dir) = env(CLI_HOME_ENV).filter(|d| !d.is_empty()) {
        settings.cli_home = home.join(dir);
    }

    let config_path = settings.config_path();
    if config_path.is_file() {
        tracing::debug!("Loading config from {}", config_path.display());
        settings.merge_file(FileConfig::load(&config_path)?);
    }

    if let Some(registry) = env(REGISTRY_ENV).filter(|r| !r.is_empty()) {
        settings.registry = registry;
    }

    Ok(settings)
}

/// Variables from a dotenv file; empty when the file does not exist.
///
/// # Errors
/// Returns [`SproutError::ConfigParseError`] for a malformed line.
pub fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    tracing::debug!("Loading environment from {}", path.display());

    let parse_error = |e: dotenvy::Error| SproutError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    dotenvy::from_path_iter(path)
        .map_err(parse_error)?
        .map(|item| item.map_err(parse_error))
        .collect()
}
