//! Sprout - Project scaffolding and on-demand commands.
//!
//! Sprout creates projects from versioned template packages and runs
//! sub-commands that are published as separate packages, fetching both
//! into a local cache under `~/.sprout`.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings from defaults, the config file and the environment
//! - [`dispatch`] - Mapping sub-commands to packages and running their entries
//! - [`error`] - Error types and result aliases
//! - [`package`] - The versioned package cache and tarball installer
//! - [`registry`] - Registry metadata and version resolution
//! - [`shell`] - Process spawning and platform checks
//! - [`template`] - Project templates: prompts, rendering, installation
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//! - [`updates`] - Self-update notification
//!
//! # Example
//!
//! ```
//! use sprout::template::render_str;
//! use std::path::Path;
//!
//! let mut context = serde_json::Map::new();
//! context.insert("projectName".into(), "my-app".into());
//! let text = render_str("# <%= projectName %>", &context, Path::new("README.md")).unwrap();
//! assert_eq!(text, "# my-app");
//! ```

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod package;
pub mod registry;
pub mod shell;
pub mod template;
pub mod ui;
pub mod updates;

pub use error::{Result, SproutError};
