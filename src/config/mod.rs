//! Configuration for Sprout.
//!
//! # Example
//!
//! ```
//! use sprout::config::load_settings;
//! use tempfile::TempDir;
//!
//! let home = TempDir::new().unwrap();
//! let settings = load_settings(home.path(), |_| None).unwrap();
//! assert!(settings.cli_home.ends_with(".sprout"));
//! ```

pub mod settings;

pub use settings::{
    load_settings, read_dotenv, FileConfig, Settings, CLI_HOME_ENV, CONFIG_FILE, DEFAULT_CLI_HOME,
    DOTENV_FILE, TARGET_PATH_ENV,
};
