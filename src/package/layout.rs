//! On-disk layout of the package store.

use std::path::{Path, PathBuf};

use crate::error::{Result, SproutError};

/// How cached packages are laid out under a store directory.
///
/// Chosen once per process with [`CacheLayout::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLayout {
    /// `{store}/_{sanitized}@{version}@{name}`: every version gets its own
    /// directory, and the trailing `{name}` keeps scoped packages that share a
    /// leaf name apart.
    Compound,
    /// `{store}/{name}`: one directory per package, scopes nest natively.
    Simple,
}

impl CacheLayout {
    /// Layout for the running platform.
    ///
    /// # Errors
    /// Returns [`SproutError::UnsupportedPlatform`] outside the unix and
    /// windows families.
    pub fn detect() -> Result<Self> {
        Self::for_family(std::env::consts::FAMILY).map_err(|_| SproutError::UnsupportedPlatform {
            os: std::env::consts::OS.to_string(),
        })
    }

    /// Layout for a platform family name as reported by
    /// [`std::env::consts::FAMILY`].
    pub fn for_family(family: &str) -> Result<Self> {
        match family {
            "unix" => Ok(Self::Compound),
            "windows" => Ok(Self::Simple),
            other => Err(SproutError::UnsupportedPlatform {
                os: other.to_string(),
            }),
        }
    }

    /// Path of `name@version` under `store_dir`.
    pub fn cache_path(&self, store_dir: &Path, name: &str, version: &str) -> PathBuf {
        match self {
            Self::Compound => store_dir.join(format!(
                "_{}@{}@{}",
                sanitize_name(name),
                version,
                name
            )),
            Self::Simple => store_dir.join(name),
        }
    }
}

/// Package name with path separators replaced, usable as a single segment.
pub fn sanitize_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}
