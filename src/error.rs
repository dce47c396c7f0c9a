//! Error types for Sprout operations.
//!
//! This module defines [`SproutError`], the error type shared by the package
//! cache, the command dispatcher and the template installer, and a [`Result`]
//! type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Every variant bubbles up to `main`, which reports it and exits non-zero
//! - Nothing in this crate retries; network and subprocess failures surface once
//! - A cache miss is not an error: [`Package::exists`](crate::package::Package::exists)
//!   returns `false` and the caller installs

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Sprout operations.
#[derive(Debug, Error)]
pub enum SproutError {
    /// The registry could not be reached or returned an unreadable body.
    #[error("Registry request failed for '{package}': {message}")]
    Registry { package: String, message: String },

    /// The registry has no published versions for a package.
    #[error("Package '{name}' has no published versions")]
    PackageNotFound { name: String },

    /// A version-dependent operation ran before the version was resolved.
    #[error("Version of '{name}' has not been resolved yet")]
    UnresolvedVersion { name: String },

    /// The host platform has no cache layout.
    #[error("Unsupported platform '{os}': no package cache layout is defined")]
    UnsupportedPlatform { os: String },

    /// A package has no manifest or no declared entry.
    #[error("No entry file found for '{package}' under {}", path.display())]
    EntryNotFound { package: String, path: PathBuf },

    /// A manifest exists but could not be parsed.
    #[error("Failed to parse manifest at {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    /// No package is mapped to a sub-command.
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    /// A template command uses a program outside the whitelist.
    #[error("Command '{command}' is not allowed; expected one of: {allowed}")]
    UnauthorizedCommand { command: String, allowed: String },

    /// A subprocess failed to start.
    #[error("Failed to start '{program}': {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A subprocess exited unsuccessfully.
    #[error("Command failed with exit code {code:?}: {command}")]
    ChildFailure { command: String, code: Option<i32> },

    /// A custom template declares no entry, or the entry file is missing.
    #[error("Custom template entry missing for '{package}'")]
    CustomEntryMissing { package: String },

    /// A custom template was requested but is not in the cache.
    #[error("Template '{package}' is not present in the cache")]
    TemplateNotCached { package: String },

    /// Referenced template does not exist in the template list.
    #[error("Unknown template: {name}")]
    UnknownTemplate { name: String },

    /// The template list is empty.
    #[error("No project templates are configured")]
    NoTemplates,

    /// Project name failed validation.
    #[error("Invalid project name: {name}")]
    InvalidProjectName { name: String },

    /// Project version is not a valid semantic version.
    #[error("Invalid project version: {version}")]
    InvalidVersion { version: String },

    /// A template placeholder has no value in the render context.
    #[error("Unresolved placeholder '{key}' in {}", path.display())]
    UnresolvedPlaceholder { path: PathBuf, key: String },

    /// Failed to parse the user configuration file.
    #[error("Failed to parse config at {}: {message}", path.display())]
    ConfigParseError { path: PathBuf, message: String },

    /// The user's home directory could not be determined.
    #[error("Home directory of the current user does not exist")]
    HomeDirMissing,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SproutError {
    /// Build a [`SproutError::Registry`] from any displayable cause.
    pub fn registry(package: &str, message: impl std::fmt::Display) -> Self {
        Self::Registry {
            package: package.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for Sprout operations.
pub type Result<T> = std::result::Result<T, SproutError>;
