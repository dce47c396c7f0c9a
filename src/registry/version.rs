//! Version resolution against a registry.
//!
//! Two policies live here and are kept apart on purpose:
//! - [`VersionResolver::latest_version`] picks the newest published version and
//!   is used for dependency and template installs;
//! - [`VersionResolver::latest_satisfying`] stays within `^base` and is used
//!   by the self-update check.

use semver::{Version, VersionReq};

use super::client::RegistryClient;
use crate::error::Result;

/// Resolves published versions of a package.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    client: RegistryClient,
}

impl VersionResolver {
    /// Create a resolver backed by a registry client.
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }

    /// Create a resolver for a registry URL.
    pub fn from_url(registry: &str) -> Result<Self> {
        Ok(Self::new(RegistryClient::new(registry)?))
    }

    /// All published version strings of `name`.
    ///
    /// An unknown package (non-success status) yields an empty list.
    ///
    /// # Errors
    /// Propagates [`SproutError::Registry`](crate::SproutError::Registry) on
    /// transport failure.
    pub fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        Ok(self
            .client
            .fetch_metadata(name)?
            .map(|meta| versions_from_metadata(&meta))
            .unwrap_or_default())
    }

    /// The greatest published version of `name`, if any.
    pub fn latest_version(&self, name: &str) -> Result<Option<String>> {
        let versions = self.list_versions(name)?;
        Ok(max_version(&versions))
    }

    /// The greatest published version of `name` compatible with `^base`.
    pub fn latest_satisfying(&self, base: &str, name: &str) -> Result<Option<String>> {
        let versions = self.list_versions(name)?;
        Ok(max_satisfying(base, &versions))
    }
}

/// Keys of the `versions` object of a registry document.
pub fn versions_from_metadata(metadata: &serde_json::Value) -> Vec<String> {
    metadata
        .get("versions")
        .and_then(|v| v.as_object())
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default()
}

fn parse_all(versions: &[String]) -> Vec<Version> {
    versions
        .iter()
        .filter_map(|v| match Version::parse(v) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::debug!("ignoring unparsable version '{}'", v);
                None
            }
        })
        .collect()
}

/// The maximum of `versions` under semver precedence.
pub fn max_version(versions: &[String]) -> Option<String> {
    parse_all(versions).into_iter().max().map(|v| v.to_string())
}

/// The maximum of `versions` matching the caret range `^base`.
///
/// Returns `None` when `base` is not a valid version or nothing matches.
pub fn max_satisfying(base: &str, versions: &[String]) -> Option<String> {
    let req = VersionReq::parse(&format!("^{}", base.trim_start_matches('v'))).ok()?;
    parse_all(versions)
        .into_iter()
        .filter(|v| req.matches(v))
        .max()
        .map(|v| v.to_string())
}
