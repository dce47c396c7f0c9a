//! A single package in the versioned cache.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, SproutError};
use crate::registry::VersionResolver;

use super::entry::resolve_entry;
use super::install::{InstallRequest, Installer, TarballInstaller};
use super::layout::CacheLayout;

/// Requested version meaning "whatever the registry says is newest".
pub const LATEST: &str = "latest";

/// Construction parameters for a [`Package`].
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Registry name of the package.
    pub name: String,
    /// Concrete version, or [`LATEST`].
    pub version: String,
    /// Package root in unversioned mode, install root otherwise.
    pub target_path: PathBuf,
    /// Store directory; `None` selects unversioned mode.
    pub store_dir: Option<PathBuf>,
    /// Registry base URL.
    pub registry: String,
}

impl PackageOptions {
    /// Options for the newest version of `name` kept under `store_dir`.
    pub fn latest(name: &str, target_path: &Path, store_dir: &Path, registry: &str) -> Self {
        Self {
            name: name.to_string(),
            version: LATEST.to_string(),
            target_path: target_path.to_path_buf(),
            store_dir: Some(store_dir.to_path_buf()),
            registry: registry.to_string(),
        }
    }

    /// Options for a package that lives at `path` and is never fetched.
    pub fn local(name: &str, path: &Path, registry: &str) -> Self {
        Self {
            name: name.to_string(),
            version: LATEST.to_string(),
            target_path: path.to_path_buf(),
            store_dir: None,
            registry: registry.to_string(),
        }
    }
}

/// One package as seen by the cache: where it lives and how to get it there.
///
/// `resolved_version` stays `None` until [`prepare`](Self::prepare) runs.
/// After that it only changes when [`update`](Self::update) installs a newer
/// version.
pub struct Package {
    name: String,
    requested_version: String,
    resolved_version: Option<String>,
    target_path: PathBuf,
    store_dir: Option<PathBuf>,
    registry: String,
    layout: CacheLayout,
    resolver: VersionResolver,
    installer: Arc<dyn Installer>,
}

impl Package {
    /// Create a package using the host layout and the tarball installer.
    ///
    /// # Errors
    /// Fails on platforms without a cache layout and on malformed registry
    /// URLs. No network access happens here.
    pub fn new(options: PackageOptions) -> Result<Self> {
        let layout = CacheLayout::detect()?;
        let resolver = VersionResolver::from_url(&options.registry)?;

        Ok(Self {
            name: options.name,
            requested_version: options.version,
            resolved_version: None,
            target_path: options.target_path,
            store_dir: options.store_dir,
            registry: options.registry,
            layout,
            resolver,
            installer: Arc::new(TarballInstaller::new()),
        })
    }

    /// Use a different installer.
    pub fn with_installer(mut self, installer: Arc<dyn Installer>) -> Self {
        self.installer = installer;
        self
    }

    /// Use a specific layout instead of the host's.
    pub fn with_layout(mut self, layout: CacheLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requested_version(&self) -> &str {
        &self.requested_version
    }

    pub fn resolved_version(&self) -> Option<&str> {
        self.resolved_version.as_deref()
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn store_dir(&self) -> Option<&Path> {
        self.store_dir.as_deref()
    }

    /// Whether this package multiplexes versions under a store directory.
    pub fn is_versioned(&self) -> bool {
        self.store_dir.is_some()
    }

    /// Create the store directory and fix the concrete version.
    ///
    /// Only an unresolved [`LATEST`] request touches the registry.
    ///
    /// # Errors
    /// Registry failures propagate; a package without published versions is
    /// [`SproutError::PackageNotFound`].
    pub fn prepare(&mut self) -> Result<()> {
        if let Some(store) = &self.store_dir {
            fs::create_dir_all(store)?;
        }

        if self.resolved_version.is_some() {
            return Ok(());
        }

        let version = if self.requested_version == LATEST {
            self.fetch_latest()?
        } else {
            self.requested_version.clone()
        };
        debug!("Resolved {} to {}", self.name, version);
        self.resolved_version = Some(version);
        Ok(())
    }

    /// Whether the package is present on disk.
    ///
    /// Unversioned packages are checked at the target path without any
    /// network access.
    pub fn exists(&mut self) -> Result<bool> {
        if self.store_dir.is_none() {
            return Ok(self.target_path.exists());
        }
        self.prepare()?;
        Ok(self.cache_file_path(None)?.exists())
    }

    /// Install the resolved version.
    ///
    /// Does not check whether it is already present; callers go through
    /// [`exists`](Self::exists) first.
    pub fn install(&mut self) -> Result<()> {
        self.prepare()?;
        let version = self.resolved()?.to_string();
        self.install_version(&version)
    }

    /// Install the newest published version if its directory is missing.
    ///
    /// Returns whether anything was installed. Unversioned packages are
    /// never updated.
    pub fn update(&mut self) -> Result<bool> {
        if self.store_dir.is_none() {
            return Ok(false);
        }
        self.prepare()?;

        let latest = self.fetch_latest()?;
        if self.cache_file_path(Some(&latest))?.exists() {
            debug!("{}@{} is current", self.name, latest);
            return Ok(false);
        }

        self.install_version(&latest)?;
        self.resolved_version = Some(latest);
        Ok(true)
    }

    /// Install when absent, update when present.
    pub fn fetch_or_update(&mut self) -> Result<()> {
        if self.exists()? {
            self.update()?;
        } else {
            self.install()?;
        }
        Ok(())
    }

    /// Where `version` (default: the resolved one) lives on disk.
    ///
    /// # Errors
    /// Returns [`SproutError::UnresolvedVersion`] when the layout needs a
    /// version and none is known.
    pub fn cache_file_path(&self, version: Option<&str>) -> Result<PathBuf> {
        let Some(store) = &self.store_dir else {
            return Ok(self.target_path.clone());
        };

        match self.layout {
            CacheLayout::Simple => Ok(self.layout.cache_path(store, &self.name, "")),
            CacheLayout::Compound => {
                let version = match version {
                    Some(v) => v,
                    None => self.resolved()?,
                };
                Ok(self.layout.cache_path(store, &self.name, version))
            }
        }
    }

    /// Directory the package's files are in.
    pub fn install_dir(&self) -> Result<PathBuf> {
        self.cache_file_path(None)
    }

    /// The package's declared entry file, if any.
    pub fn entry_file_path(&self) -> Result<Option<PathBuf>> {
        Ok(resolve_entry(&self.install_dir()?))
    }

    fn resolved(&self) -> Result<&str> {
        self.resolved_version
            .as_deref()
            .ok_or_else(|| SproutError::UnresolvedVersion {
                name: self.name.clone(),
            })
    }

    fn fetch_latest(&self) -> Result<String> {
        self.resolver
            .latest_version(&self.name)?
            .ok_or_else(|| SproutError::PackageNotFound {
                name: self.name.clone(),
            })
    }

    fn install_version(&self, version: &str) -> Result<()> {
        let request = InstallRequest {
            registry: self.registry.clone(),
            name: self.name.clone(),
            version: version.to_string(),
            destination: self.cache_file_path(Some(version))?,
        };
        debug!(
            "Installing {}@{} into {}",
            request.name,
            request.version,
            request.destination.display()
        );
        self.installer.install(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingInstaller {
        requests: Mutex<Vec<InstallRequest>>,
    }

    impl RecordingInstaller {
        fn versions(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.version.clone())
                .collect()
        }
    }

    impl Installer for RecordingInstaller {
        fn install(&self, request: &InstallRequest) -> Result<()> {
            fs::create_dir_all(&request.destination)?;
            fs::write(
                request.destination.join("package.json"),
                r#"{"main":"bin/cli.js"}"#,
            )?;
            self.requests.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    fn registry_with<'a>(server: &'a MockServer, name: &str, versions: &[&str]) -> httpmock::Mock<'a> {
        let versions: serde_json::Map<String, serde_json::Value> = versions
            .iter()
            .map(|v| (v.to_string(), serde_json::json!({})))
            .collect();
        let body = serde_json::json!({ "name": name, "versions": versions });
        server.mock(|when, then| {
            when.method(GET).path(format!("/{name}"));
            then.status(200).json_body(body);
        })
    }

    fn versioned(server: &MockServer, temp: &TempDir, version: &str) -> (Package, Arc<RecordingInstaller>) {
        let installer = Arc::new(RecordingInstaller::default());
        let store = temp.path().join("node_modules");
        let mut options = PackageOptions::latest("pkg-a", temp.path(), &store, &server.base_url());
        options.version = version.to_string();
        let package = Package::new(options)
            .unwrap()
            .with_layout(CacheLayout::Compound)
            .with_installer(installer.clone());
        (package, installer)
    }

    #[test]
    fn prepare_resolves_latest_and_creates_store() {
        let server = MockServer::start();
        registry_with(&server, "pkg-a", &["1.0.0", "1.2.0"]);
        let temp = TempDir::new().unwrap();
        let (mut package, _) = versioned(&server, &temp, LATEST);

        assert_eq!(package.resolved_version(), None);
        package.prepare().unwrap();

        assert_eq!(package.resolved_version(), Some("1.2.0"));
        assert!(temp.path().join("node_modules").is_dir());
    }

    #[test]
    fn prepare_with_concrete_version_skips_registry() {
        let server = MockServer::start();
        let mock = registry_with(&server, "pkg-a", &["1.0.0"]);
        let temp = TempDir::new().unwrap();
        let (mut package, _) = versioned(&server, &temp, "0.9.0");

        package.prepare().unwrap();

        assert_eq!(package.resolved_version(), Some("0.9.0"));
        mock.assert_calls(0);
    }

    #[test]
    fn prepare_without_versions_is_not_found() {
        let server = MockServer::start();
        registry_with(&server, "pkg-a", &[]);
        let temp = TempDir::new().unwrap();
        let (mut package, _) = versioned(&server, &temp, LATEST);

        let err = package.prepare().unwrap_err();
        assert!(matches!(err, SproutError::PackageNotFound { .. }));
    }

    #[test]
    fn cache_path_needs_resolved_version() {
        let server = MockServer::start();
        let temp = TempDir::new().unwrap();
        let (package, _) = versioned(&server, &temp, LATEST);

        let err = package.cache_file_path(None).unwrap_err();
        assert!(matches!(err, SproutError::UnresolvedVersion { .. }));
    }

    #[test]
    fn cache_path_is_deterministic() {
        let server = MockServer::start();
        let temp = TempDir::new().unwrap();
        let (package, _) = versioned(&server, &temp, LATEST);

        let first = package.cache_file_path(Some("1.2.0")).unwrap();
        let second = package.cache_file_path(Some("1.2.0")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, temp.path().join("node_modules/_pkg-a@1.2.0@pkg-a"));
    }

    #[test]
    fn simple_layout_ignores_version() {
        let server = MockServer::start();
        let temp = TempDir::new().unwrap();
        let (package, _) = versioned(&server, &temp, LATEST);
        let package = package.with_layout(CacheLayout::Simple);

        assert_eq!(
            package.cache_file_path(None).unwrap(),
            temp.path().join("node_modules/pkg-a")
        );
    }

    #[test]
    fn update_is_noop_when_current() {
        let server = MockServer::start();
        registry_with(&server, "pkg-a", &["1.0.0", "1.2.0"]);
        let temp = TempDir::new().unwrap();
        let (mut package, installer) = versioned(&server, &temp, LATEST);

        package.install().unwrap();
        assert!(!package.update().unwrap());

        assert_eq!(installer.versions(), vec!["1.2.0".to_string()]);
        assert!(package.exists().unwrap());
    }

    #[test]
    fn update_installs_newer_version() {
        let server = MockServer::start();
        registry_with(&server, "pkg-a", &["1.0.0", "1.3.0"]);
        let temp = TempDir::new().unwrap();
        let (mut package, installer) = versioned(&server, &temp, "1.0.0");

        package.install().unwrap();
        assert!(package.update().unwrap());

        assert_eq!(package.resolved_version(), Some("1.3.0"));
        assert_eq!(installer.versions(), vec!["1.0.0", "1.3.0"]);
        assert!(package.install_dir().unwrap().ends_with("_pkg-a@1.3.0@pkg-a"));
    }

    #[test]
    fn unversioned_package_uses_target_path() {
        let temp = TempDir::new().unwrap();
        let installer = Arc::new(RecordingInstaller::default());
        let mut package = Package::new(PackageOptions::local(
            "pkg-a",
            temp.path(),
            "http://127.0.0.1:9",
        ))
        .unwrap()
        .with_installer(installer.clone());

        assert!(package.exists().unwrap());
        assert!(!package.update().unwrap());
        assert_eq!(package.cache_file_path(None).unwrap(), temp.path());
        assert!(installer.versions().is_empty());
    }

    #[test]
    fn entry_file_path_reads_manifest() {
        let server = MockServer::start();
        registry_with(&server, "pkg-a", &["1.0.0"]);
        let temp = TempDir::new().unwrap();
        let (mut package, _) = versioned(&server, &temp, LATEST);

        package.fetch_or_update().unwrap();

        let entry = package.entry_file_path().unwrap().unwrap();
        assert!(entry.to_string_lossy().ends_with("_pkg-a@1.0.0@pkg-a/bin/cli.js"));
    }
}
