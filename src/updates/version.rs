//! Version checking against the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Result, SproutError};
use crate::registry::VersionResolver;

/// Current version of sprout.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Registry package sprout is published as.
pub const CORE_PACKAGE: &str = "@sprout-cli/core";

/// How often to check for updates (1 day).
const CHECK_INTERVAL_SECS: i64 = 86400;

/// Information about an available update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInfo {
    /// Current version.
    pub current: String,
    /// Newest compatible version.
    pub latest: String,
    /// Whether an update is available.
    pub update_available: bool,
    /// When this check was performed.
    pub checked_at: DateTime<Utc>,
}

/// Cached update check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UpdateCache {
    info: UpdateInfo,
    cached_at: DateTime<Utc>,
}

/// Looks for newer compatible releases of sprout.
///
/// Only versions within the current caret range (`^VERSION`) count, so a new
/// major release is never suggested.
pub struct UpdateChecker {
    resolver: VersionResolver,
    cache_path: PathBuf,
    package: String,
    current: String,
}

impl UpdateChecker {
    pub fn new(resolver: VersionResolver, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            resolver,
            cache_path: cache_path.into(),
            package: CORE_PACKAGE.to_string(),
            current: VERSION.to_string(),
        }
    }

    /// Check a different registry package.
    pub fn with_package(mut self, package: &str) -> Self {
        self.package = package.to_string();
        self
    }

    /// Pretend to be a different version.
    pub fn with_current(mut self, version: &str) -> Self {
        self.current = version.to_string();
        self
    }

    /// Check for updates, using a cached result younger than a day.
    ///
    /// Failures are logged and yield `None`.
    pub fn check(&self) -> Option<UpdateInfo> {
        if let Some(cached) = self.load_cache() {
            let age = Utc::now()
                .signed_duration_since(cached.cached_at)
                .num_seconds();
            if age < CHECK_INTERVAL_SECS && cached.info.current == self.current {
                debug!("Using cached update check from {}", cached.cached_at);
                return Some(cached.info);
            }
        }

        match self.check_fresh() {
            Ok(info) => {
                if let Err(e) = self.save_cache(&info) {
                    debug!("Failed to cache update check: {}", e);
                }
                Some(info)
            }
            Err(e) => {
                debug!("Update check failed: {}", e);
                None
            }
        }
    }

    /// Check for updates without using the cache.
    pub fn check_fresh(&self) -> Result<UpdateInfo> {
        let latest = self
            .resolver
            .latest_satisfying(&self.current, &self.package)?
            .unwrap_or_else(|| self.current.clone());

        Ok(UpdateInfo {
            update_available: is_newer_version(&latest, &self.current),
            current: self.current.clone(),
            latest,
            checked_at: Utc::now(),
        })
    }

    fn load_cache(&self) -> Option<UpdateCache> {
        let content = fs::read_to_string(&self.cache_path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn save_cache(&self, info: &UpdateInfo) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let cache = UpdateCache {
            info: info.clone(),
            cached_at: Utc::now(),
        };
        let content =
            serde_json::to_string_pretty(&cache).map_err(|e| SproutError::Other(e.into()))?;
        fs::write(&self.cache_path, content)?;
        Ok(())
    }
}

/// Whether `latest` has higher semver precedence than `current`.
fn is_newer_version(latest: &str, current: &str) -> bool {
    match (
        semver::Version::parse(latest.trim_start_matches('v')),
        semver::Version::parse(current.trim_start_matches('v')),
    ) {
        (Ok(l), Ok(c)) => l > c,
        _ => false,
    }
}
