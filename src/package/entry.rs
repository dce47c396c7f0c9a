//! Manifest discovery and entry point resolution.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, SproutError};

/// Name of the package manifest file.
pub const MANIFEST_FILE: &str = "package.json";

/// The fields of a package manifest this crate reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Package name.
    #[serde(default)]
    pub name: Option<String>,
    /// Package version.
    #[serde(default)]
    pub version: Option<String>,
    /// Declared entry file, relative to the manifest directory.
    #[serde(default)]
    pub main: Option<String>,
    /// Runtime dependencies.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl Manifest {
    /// Load and parse a manifest file.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read and `ManifestParse` if it is not
    /// a JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| SproutError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Find the nearest directory at or above `start` holding a manifest.
///
/// `start` itself must exist; a missing package directory never resolves to
/// some unrelated manifest further up the tree.
pub fn find_manifest_dir(start: &Path) -> Option<PathBuf> {
    if !start.exists() {
        return None;
    }

    let mut current = start.to_path_buf();
    loop {
        if current.join(MANIFEST_FILE).is_file() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Resolve the entry file of the package rooted at (or below) `root`.
///
/// Returns `None` when there is no manifest, the manifest declares no `main`,
/// or the manifest cannot be parsed. Callers treat `None` as "nothing to
/// execute".
pub fn resolve_entry(root: &Path) -> Option<PathBuf> {
    let dir = find_manifest_dir(root)?;
    let manifest = match Manifest::load(&dir.join(MANIFEST_FILE)) {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::debug!("skipping manifest in {}: {}", dir.display(), e);
            return None;
        }
    };

    let main = manifest.main.filter(|m| !m.trim().is_empty())?;
    let entry = lexical_normalize(&dir.join(main));
    Some(normalize_separators(&entry))
}

/// Drop `.` components and fold `..` components without touching the disk.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Rewrite a path so that it uses `/` as separator on every host.
pub fn normalize_separators(path: &Path) -> PathBuf {
    PathBuf::from(normalize_separators_str(
        &path.to_string_lossy(),
        std::path::MAIN_SEPARATOR,
    ))
}

/// String form of [`normalize_separators`] for a given host separator.
pub fn normalize_separators_str(path: &str, separator: char) -> String {
    if separator == '/' {
        path.to_string()
    } else {
        path.replace(separator, "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, json: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), json).unwrap();
    }

    #[test]
    fn resolves_main_relative_to_manifest() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), r#"{"name":"pkg","main":"lib/index.js"}"#);

        let entry = resolve_entry(temp.path()).unwrap();
        assert!(entry.ends_with("lib/index.js"));
        assert!(entry.starts_with(normalize_separators(temp.path())));
    }

    #[test]
    fn strips_dot_segments() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), r#"{"main":"./lib/../bin/run.js"}"#);

        let entry = resolve_entry(temp.path()).unwrap();
        assert!(entry.ends_with("bin/run.js"));
        assert!(!entry.to_string_lossy().contains("/./"));
        assert!(!entry.to_string_lossy().contains(".."));
    }

    #[test]
    fn walks_up_to_nearest_manifest() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), r#"{"main":"index.js"}"#);
        let nested = temp.path().join("lib").join("deep");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_manifest_dir(&nested).unwrap(), temp.path());
        assert!(resolve_entry(&nested).unwrap().ends_with("index.js"));
    }

    #[test]
    fn missing_main_is_none() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), r#"{"name":"pkg"}"#);
        assert!(resolve_entry(temp.path()).is_none());
    }

    #[test]
    fn empty_main_is_none() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), r#"{"main":"  "}"#);
        assert!(resolve_entry(temp.path()).is_none());
    }

    #[test]
    fn unparsable_manifest_is_none() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "{ not json");
        assert!(resolve_entry(temp.path()).is_none());
    }

    #[test]
    fn missing_root_is_none() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), r#"{"main":"index.js"}"#);
        assert!(resolve_entry(&temp.path().join("not-installed")).is_none());
    }

    #[test]
    fn manifest_load_reads_dependencies() {
        let temp = TempDir::new().unwrap();
        write_manifest(
            temp.path(),
            r#"{"name":"pkg","version":"1.0.0","dependencies":{"ejs":"^3.1.0"}}"#,
        );
        let manifest = Manifest::load(&temp.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("pkg"));
        assert_eq!(manifest.dependencies.get("ejs").map(String::as_str), Some("^3.1.0"));
    }

    #[test]
    fn manifest_parse_error_names_path() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "[]");
        let err = Manifest::load(&temp.path().join(MANIFEST_FILE)).unwrap_err();
        assert!(matches!(err, SproutError::ManifestParse { .. }));
    }

    #[test]
    fn separators_normalized_for_backslash_hosts() {
        assert_eq!(
            normalize_separators_str(r"C:\cache\pkg\index.js", '\\'),
            "C:/cache/pkg/index.js"
        );
        assert_eq!(normalize_separators_str("/cache/pkg", '/'), "/cache/pkg");
    }
}
