//! End-to-end tests for the package cache against a mock registry.

use flate2::write::GzEncoder;
use flate2::Compression;
use httpmock::prelude::*;
use sprout::package::{Package, PackageOptions, LATEST};
use std::fs;
use std::io::Write;
use tempfile::TempDir;

const MANIFEST: &str = r#"{"name": "pkg-a", "version": "0.0.0", "main": "lib/index.js"}"#;

fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut tar_bytes = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut tar_bytes);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(format!("package/{name}")).unwrap();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, content.as_bytes()).unwrap();
        }
        builder.finish().unwrap();
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes).unwrap();
    encoder.finish().unwrap()
}

/// Publish `versions` of pkg-a; returns the metadata mock.
fn publish<'a>(server: &'a MockServer, versions: &[&str]) -> httpmock::Mock<'a> {
    let bytes = tarball(&[
        ("package.json", MANIFEST),
        ("lib/index.js", "module.exports = () => 0;\n"),
    ]);
    let mut documents = serde_json::Map::new();
    for version in versions {
        let path = format!("/pkg-a/-/pkg-a-{version}.tgz");
        documents.insert(
            version.to_string(),
            serde_json::json!({ "dist": { "tarball": server.url(&path) } }),
        );
        let body = bytes.clone();
        server.mock(|when, then| {
            when.method(GET).path(path);
            then.status(200).body(body);
        });
    }
    server.mock(|when, then| {
        when.method(GET).path("/pkg-a");
        then.status(200)
            .json_body(serde_json::json!({ "name": "pkg-a", "versions": documents }));
    })
}

fn versioned(server: &MockServer, root: &TempDir) -> Package {
    Package::new(PackageOptions::latest(
        "pkg-a",
        root.path(),
        &root.path().join("node_modules"),
        &server.base_url(),
    ))
    .unwrap()
}

#[test]
fn latest_resolves_installs_and_locates_entry() {
    let server = MockServer::start();
    publish(&server, &["1.0.0", "1.2.0"]);
    let root = TempDir::new().unwrap();
    let mut package = versioned(&server, &root);

    assert_eq!(package.requested_version(), LATEST);
    package.prepare().unwrap();
    assert_eq!(package.resolved_version(), Some("1.2.0"));

    assert!(!package.exists().unwrap());
    package.install().unwrap();
    assert!(package.exists().unwrap());

    let dir = package.install_dir().unwrap();
    assert!(dir.join("package.json").is_file());
    let entry = package.entry_file_path().unwrap().unwrap();
    assert!(entry.ends_with("lib/index.js"));
    assert!(entry.is_file());
}

#[cfg(unix)]
#[test]
fn versions_get_separate_directories() {
    let server = MockServer::start();
    publish(&server, &["1.0.0", "1.2.0"]);
    let root = TempDir::new().unwrap();
    let mut package = versioned(&server, &root);

    package.fetch_or_update().unwrap();

    let store = root.path().join("node_modules");
    assert_eq!(package.install_dir().unwrap(), store.join("_pkg-a@1.2.0@pkg-a"));
    assert!(store.join("_pkg-a@1.2.0@pkg-a/lib/index.js").is_file());
    assert!(!store.join("_pkg-a@1.0.0@pkg-a").exists());
}

#[cfg(unix)]
#[test]
fn update_installs_newly_published_version() {
    let server = MockServer::start();
    let mut metadata = publish(&server, &["1.0.0"]);
    let root = TempDir::new().unwrap();

    let mut first = versioned(&server, &root);
    first.fetch_or_update().unwrap();
    assert_eq!(first.resolved_version(), Some("1.0.0"));

    metadata.delete();
    publish(&server, &["1.0.0", "1.1.0"]);

    let mut current = versioned(&server, &root);
    let updated = current.update().unwrap();
    assert!(updated);
    assert_eq!(current.resolved_version(), Some("1.1.0"));
    assert!(current.install_dir().unwrap().join("package.json").is_file());
    assert!(root.path().join("node_modules/_pkg-a@1.0.0@pkg-a").is_dir());
}

#[test]
fn update_is_noop_when_current() {
    let server = MockServer::start();
    publish(&server, &["1.0.0"]);
    let root = TempDir::new().unwrap();
    let mut package = versioned(&server, &root);

    package.fetch_or_update().unwrap();
    assert!(!package.update().unwrap());
    assert_eq!(package.resolved_version(), Some("1.0.0"));
}

#[test]
fn unpublished_package_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pkg-a");
        then.status(404);
    });
    let root = TempDir::new().unwrap();
    let mut package = versioned(&server, &root);

    let err = package.prepare().unwrap_err();
    assert!(matches!(err, sprout::SproutError::PackageNotFound { .. }));
}

#[test]
fn local_package_exists_without_network() {
    let server = MockServer::start();
    let catch_all = server.mock(|when, then| {
        when.method(GET);
        then.status(500);
    });
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), MANIFEST).unwrap();

    let mut package = Package::new(PackageOptions::local(
        "pkg-a",
        dir.path(),
        &server.base_url(),
    ))
    .unwrap();

    assert!(!package.is_versioned());
    assert!(package.exists().unwrap());
    assert!(!package.update().unwrap());
    assert_eq!(package.cache_file_path(None).unwrap(), dir.path());
    catch_all.assert_calls(0);
}
