//! Sub-command dispatch from command name to running entry.

use httpmock::prelude::*;
use sprout::config::Settings;
use sprout::dispatch::{CommandDispatcher, Executable, ExecutionMode, InvocationMessage};
use sprout::package::{InstallRequest, Installer};
use sprout::{Result, SproutError};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct RecordingExecutable {
    messages: Arc<Mutex<Vec<InvocationMessage>>>,
}

impl Executable for RecordingExecutable {
    fn run(&self, message: &InvocationMessage) -> Result<i32> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(0)
    }
}

/// Writes a package with the given manifest instead of downloading one.
struct ManifestInstaller {
    manifest: &'static str,
    installs: Mutex<Vec<String>>,
}

impl ManifestInstaller {
    fn new(manifest: &'static str) -> Arc<Self> {
        Arc::new(Self {
            manifest,
            installs: Mutex::new(Vec::new()),
        })
    }
}

impl Installer for ManifestInstaller {
    fn install(&self, request: &InstallRequest) -> Result<()> {
        fs::create_dir_all(&request.destination)?;
        fs::write(request.destination.join("package.json"), self.manifest)?;
        fs::write(request.destination.join("index.js"), "module.exports = () => 0;\n")?;
        self.installs
            .lock()
            .unwrap()
            .push(format!("{}@{}", request.name, request.version));
        Ok(())
    }
}

fn settings(home: &TempDir) -> Settings {
    let mut settings = Settings::for_home(home.path());
    settings
        .commands
        .insert("hello".to_string(), "hello-cmd".to_string());
    settings
}

fn serve_versions(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/hello-cmd");
        then.status(200)
            .json_body(serde_json::json!({ "versions": { "0.9.0": {}, "1.0.0": {} } }));
    });
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn fetches_once_then_reuses() {
    let server = MockServer::start();
    serve_versions(&server);
    let home = TempDir::new().unwrap();
    let mut settings = settings(&home);
    settings.registry = server.base_url();
    let installer = ManifestInstaller::new(r#"{"name": "hello-cmd", "main": "index.js"}"#);
    let executable = RecordingExecutable::default();

    let dispatcher = CommandDispatcher::new(settings.clone())
        .with_installer(installer.clone())
        .with_executable(Box::new(executable.clone()));

    assert_eq!(dispatcher.dispatch("hello", &args(&["a", "--loud"])).unwrap(), 0);
    assert_eq!(dispatcher.dispatch("hello", &args(&["b"])).unwrap(), 0);

    assert_eq!(*installer.installs.lock().unwrap(), vec!["hello-cmd@1.0.0"]);
    let messages = executable.messages.lock().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0]
        .entry_path
        .starts_with(settings.dependencies_store()));
    assert!(messages[0].entry_path.ends_with("index.js"));
    assert_eq!(messages[0].payload["command"], "hello");
    assert_eq!(messages[0].payload["args"], serde_json::json!(["a"]));
    assert_eq!(messages[0].payload["options"]["loud"], true);
    assert_eq!(messages[1].payload["args"], serde_json::json!(["b"]));
}

#[test]
fn package_without_main_has_no_entry() {
    let server = MockServer::start();
    serve_versions(&server);
    let home = TempDir::new().unwrap();
    let mut settings = settings(&home);
    settings.registry = server.base_url();

    let dispatcher = CommandDispatcher::new(settings)
        .with_installer(ManifestInstaller::new(r#"{"name": "hello-cmd"}"#))
        .with_executable(Box::new(RecordingExecutable::default()));

    let err = dispatcher.dispatch("hello", &[]).unwrap_err();
    assert!(matches!(err, SproutError::EntryNotFound { package, .. } if package == "hello-cmd"));
}

#[test]
fn unknown_command_never_touches_registry() {
    let server = MockServer::start();
    let registry = server.mock(|when, then| {
        when.method(GET);
        then.status(200);
    });
    let home = TempDir::new().unwrap();
    let mut settings = settings(&home);
    settings.registry = server.base_url();

    let err = CommandDispatcher::new(settings)
        .dispatch("nope", &[])
        .unwrap_err();

    assert!(matches!(err, SproutError::UnknownCommand { name } if name == "nope"));
    registry.assert_calls(0);
}

fn local_package(dir: &Path, main: &str) {
    fs::write(
        dir.join("package.json"),
        format!(r#"{{"name": "hello-cmd", "main": "{main}"}}"#),
    )
    .unwrap();
}

#[test]
fn inline_failures_become_exit_code_one() {
    let home = TempDir::new().unwrap();
    let pkg = TempDir::new().unwrap();
    local_package(pkg.path(), "index.js");
    fs::write(pkg.path().join("index.js"), "").unwrap();

    let mut settings = settings(&home);
    settings.target_path = Some(pkg.path().to_path_buf());
    settings.execution = ExecutionMode::Inline;
    settings.runtime = "sprout-test-missing-runtime".to_string();

    let code = CommandDispatcher::new(settings)
        .dispatch("hello", &args(&["x"]))
        .unwrap();
    assert_eq!(code, 1);
}

#[cfg(unix)]
#[test]
fn subprocess_spawn_failure_is_an_error() {
    let home = TempDir::new().unwrap();
    let pkg = TempDir::new().unwrap();
    local_package(pkg.path(), "index.js");
    fs::write(pkg.path().join("index.js"), "").unwrap();

    let mut settings = settings(&home);
    settings.target_path = Some(pkg.path().to_path_buf());
    settings.runtime = "sprout-test-missing-runtime".to_string();

    let err = CommandDispatcher::new(settings)
        .dispatch("hello", &[])
        .unwrap_err();
    assert!(matches!(err, SproutError::SpawnError { .. }));
}

#[cfg(unix)]
#[test]
fn native_entry_gets_invocation_and_mirrors_exit_code() {
    use std::os::unix::fs::PermissionsExt;

    let home = TempDir::new().unwrap();
    let pkg = TempDir::new().unwrap();
    local_package(pkg.path(), "bin/run");
    fs::create_dir(pkg.path().join("bin")).unwrap();
    let entry = pkg.path().join("bin/run");
    let out = pkg.path().join("invocation.json");
    fs::write(
        &entry,
        format!(
            "#!/bin/sh\nprintf '%s' \"$SPROUT_INVOCATION\" > '{}'\nexit 5\n",
            out.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&entry, fs::Permissions::from_mode(0o755)).unwrap();

    let mut settings = settings(&home);
    settings.target_path = Some(pkg.path().to_path_buf());

    let code = CommandDispatcher::new(settings)
        .dispatch("hello", &args(&["--name=x", "--_internal=1", "--parent=p"]))
        .unwrap();

    assert_eq!(code, 5);
    let message: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(message["entryPath"], serde_json::json!(entry));
    let options = message["payload"]["options"].as_object().unwrap();
    assert_eq!(options["name"], "x");
    assert!(!options.contains_key("_internal"));
    assert!(!options.contains_key("parent"));
}
