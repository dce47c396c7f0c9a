//! Package installation: download, verify and unpack a published tarball.

use base64::Engine;
use flate2::read::GzDecoder;
use sha2::{Digest, Sha512};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tar::Archive;
use tracing::debug;

use crate::error::{Result, SproutError};
use crate::registry::RegistryClient;
use crate::shell::{CommandOptions, ProcessRunner, SystemRunner};

use super::entry::{Manifest, MANIFEST_FILE};

/// Maximum tarball size (200 MB).
pub const MAX_TARBALL_SIZE: u64 = 200 * 1024 * 1024;

/// Everything an [`Installer`] needs to place one package version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Registry base URL.
    pub registry: String,
    /// Package name.
    pub name: String,
    /// Concrete version to install.
    pub version: String,
    /// Directory the package contents must end up in.
    pub destination: PathBuf,
}

/// Places a package version on disk.
///
/// Implementations must leave `request.destination` holding the package's
/// manifest on success and must not leave a partial destination behind on
/// failure.
pub trait Installer {
    fn install(&self, request: &InstallRequest) -> Result<()>;
}

/// Installs packages from the registry's published tarballs.
pub struct TarballInstaller {
    runner: Arc<dyn ProcessRunner>,
    install_dependencies: bool,
}

impl Default for TarballInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl TarballInstaller {
    /// Installer that runs `npm` for packages with runtime dependencies.
    pub fn new() -> Self {
        Self {
            runner: Arc::new(SystemRunner),
            install_dependencies: true,
        }
    }

    /// Use a different runner for the dependency install.
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Skip installing the package's own dependencies.
    pub fn without_dependencies(mut self) -> Self {
        self.install_dependencies = false;
        self
    }

    fn install_package_dependencies(&self, request: &InstallRequest) -> Result<()> {
        let manifest = Manifest::load(&request.destination.join(MANIFEST_FILE))?;
        if manifest.dependencies.is_empty() {
            return Ok(());
        }

        debug!(
            "Installing {} dependencies of {}@{}",
            manifest.dependencies.len(),
            request.name,
            request.version
        );
        let args: Vec<String> = ["install", "--omit=dev", "--no-audit", "--no-fund"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let code = self.runner.run(
            "npm",
            &args,
            &CommandOptions::in_dir(&request.destination),
        )?;

        if code != Some(0) {
            return Err(SproutError::ChildFailure {
                command: format!("npm {}", args.join(" ")),
                code,
            });
        }
        Ok(())
    }
}

impl Installer for TarballInstaller {
    fn install(&self, request: &InstallRequest) -> Result<()> {
        let client = RegistryClient::new(&request.registry)?;
        let metadata = client
            .fetch_version_metadata(&request.name, &request.version)?
            .ok_or_else(|| SproutError::PackageNotFound {
                name: format!("{}@{}", request.name, request.version),
            })?;

        let dist = metadata.get("dist");
        let tarball_url = dist
            .and_then(|d| d.get("tarball"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| SproutError::registry(&request.name, "version has no dist.tarball"))?;
        let integrity = dist
            .and_then(|d| d.get("integrity"))
            .and_then(|i| i.as_str());

        debug!("Downloading {}", tarball_url);
        let bytes = download_tarball(&client, &request.name, tarball_url, MAX_TARBALL_SIZE)?;

        match integrity {
            Some(sri) => verify_integrity(&request.name, &bytes, sri)?,
            None => debug!("{} publishes no integrity hash", request.name),
        }

        extract_tgz_atomic(&bytes, &request.destination)?;

        if self.install_dependencies {
            if let Err(e) = self.install_package_dependencies(request) {
                let _ = fs::remove_dir_all(&request.destination);
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Download a tarball, refusing bodies larger than `max_bytes`.
pub fn download_tarball(
    client: &RegistryClient,
    package: &str,
    url: &str,
    max_bytes: u64,
) -> Result<Vec<u8>> {
    let response = client
        .http()
        .get(url)
        .send()
        .map_err(|e| SproutError::registry(package, format!("failed to download '{url}': {e}")))?;

    if !response.status().is_success() {
        return Err(SproutError::registry(
            package,
            format!("download failed with status {} for '{url}'", response.status()),
        ));
    }

    if let Some(len) = response.content_length() {
        if len > max_bytes {
            return Err(SproutError::registry(
                package,
                format!("tarball too large: {len} bytes (max: {max_bytes})"),
            ));
        }
    }

    let bytes = response
        .bytes()
        .map_err(|e| SproutError::registry(package, format!("failed to read tarball: {e}")))?;

    if bytes.len() as u64 > max_bytes {
        return Err(SproutError::registry(
            package,
            format!("tarball too large: {} bytes (max: {max_bytes})", bytes.len()),
        ));
    }

    Ok(bytes.to_vec())
}

/// Check `bytes` against a subresource-integrity string.
///
/// Only `sha512-` entries are checked; an SRI string without one is accepted
/// as-is.
pub fn verify_integrity(package: &str, bytes: &[u8], sri: &str) -> Result<()> {
    let Some(expected) = sri
        .split_whitespace()
        .find_map(|part| part.strip_prefix("sha512-"))
    else {
        debug!("No sha512 integrity for {}, skipping check", package);
        return Ok(());
    };

    let expected = base64::engine::general_purpose::STANDARD
        .decode(expected)
        .map_err(|e| SproutError::registry(package, format!("malformed integrity: {e}")))?;
    let actual = Sha512::digest(bytes);

    if actual[..] != expected[..] {
        return Err(SproutError::registry(package, "integrity check failed"));
    }
    Ok(())
}

/// Extract a gzip tarball so its single top-level directory becomes `dest`.
///
/// Extraction happens in a temporary sibling of `dest` which is then renamed,
/// so `dest` is either absent or complete.
pub fn extract_tgz_atomic(bytes: &[u8], dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| SproutError::Other(anyhow::anyhow!("{} has no parent", dest.display())))?;
    fs::create_dir_all(parent)?;

    let temp_dir = parent.join(format!(
        ".tmp-{}-{}",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    if temp_dir.exists() {
        fs::remove_dir_all(&temp_dir)?;
    }
    fs::create_dir_all(&temp_dir)?;

    let result = extract_tgz_to(bytes, &temp_dir)
        .and_then(|()| find_extracted_root(&temp_dir))
        .and_then(|root| move_into_place(&root, dest));

    let _ = fs::remove_dir_all(&temp_dir);
    result
}

fn move_into_place(root: &Path, dest: &Path) -> Result<()> {
    match fs::rename(root, dest) {
        Ok(()) => Ok(()),
        // Another process finished the same install first.
        Err(_) if dest.join(MANIFEST_FILE).is_file() => Ok(()),
        Err(e) => {
            debug!("rename into {} failed ({}), copying", dest.display(), e);
            copy_dir_all(root, dest).map_err(|copy_err| {
                let _ = fs::remove_dir_all(dest);
                SproutError::Io(copy_err)
            })
        }
    }
}

/// The single top-level directory of an extracted tarball.
///
/// Most packages use `package/`; some use the bare package name.
fn find_extracted_root(temp_dir: &Path) -> Result<PathBuf> {
    let package_dir = temp_dir.join("package");
    if package_dir.is_dir() {
        return Ok(package_dir);
    }

    let dirs: Vec<PathBuf> = fs::read_dir(temp_dir)?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();

    match dirs.as_slice() {
        [only] => Ok(only.clone()),
        other => Err(SproutError::Other(anyhow::anyhow!(
            "tarball contains {} top-level directories, expected 1",
            other.len()
        ))),
    }
}

fn extract_tgz_to(bytes: &[u8], dest: &Path) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(bytes));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        if path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(SproutError::Other(anyhow::anyhow!(
                "tarball entry escapes destination: {}",
                path.display()
            )));
        }

        let dest_path = dest.join(&path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let kind = entry.header().entry_type();
        if kind.is_dir() {
            fs::create_dir_all(&dest_path)?;
        } else if kind.is_file() {
            let mut file = File::create(&dest_path)?;
            io::copy(&mut entry, &mut file)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Ok(mode) = entry.header().mode() {
                    let _ = fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode));
                }
            }
        }
        // Links and special entries are skipped.
    }

    Ok(())
}

/// Recursively copy a directory tree, skipping symlinks.
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        let dst_path = dst.join(entry.file_name());

        if ty.is_dir() {
            copy_dir_all(&entry.path(), &dst_path)?;
        } else if ty.is_file() {
            fs::copy(entry.path(), &dst_path)?;
        }
    }

    Ok(())
}
