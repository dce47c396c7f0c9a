//! Executing a resolved plugin entry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Result, SproutError};
use crate::shell::{CommandOptions, ProcessRunner, SystemRunner};

/// Environment variable carrying the serialized [`InvocationMessage`].
pub const INVOCATION_ENV: &str = "SPROUT_INVOCATION";

/// Environment variable carrying [`BOOTSTRAP`].
pub const BOOTSTRAP_ENV: &str = "SPROUT_BOOTSTRAP";

/// One-line `-e` program that evaluates [`BOOTSTRAP`].
///
/// `cmd /c` stops reading its command line at the first newline, so the
/// multi-line bootstrap travels in the environment instead.
pub const BOOTSTRAP_LOADER: &str = "eval(process.env.SPROUT_BOOTSTRAP)";

/// Default interpreter for script entries.
pub const DEFAULT_RUNTIME: &str = "node";

/// Script run by the interpreter in front of every script entry.
///
/// Loads the entry named in the message and calls its exported function
/// (the default export, or a `run` export) with the payload. The resolved
/// value becomes the exit code when it is a number.
pub const BOOTSTRAP: &str = r#"(async () => {
  const message = JSON.parse(process.env.SPROUT_INVOCATION);
  const { pathToFileURL } = require('url');
  const mod = await import(pathToFileURL(message.entryPath).href);
  const target = mod.default !== undefined ? mod.default : mod;
  const run = typeof target === 'function' ? target : target && target.run;
  if (typeof run !== 'function') {
    console.error(`${message.entryPath} does not export a function`);
    process.exit(1);
  }
  const code = await run(message.payload);
  process.exit(typeof code === 'number' ? code : 0);
})().catch((err) => {
  console.error(err && err.stack ? err.stack : err);
  process.exit(1);
});"#;

/// How plugin entries are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Through the bootstrap with the serialized context.
    #[default]
    Subprocess,
    /// Directly with the raw arguments.
    Inline,
}

/// What a runner is asked to execute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationMessage {
    /// Entry file to execute.
    pub entry_path: PathBuf,
    /// Value passed to the entry's exported function.
    pub payload: Value,
    /// Raw arguments, used when the entry is executed inline.
    #[serde(skip)]
    pub argv: Vec<String>,
}

impl InvocationMessage {
    pub fn new(entry_path: impl Into<PathBuf>, payload: Value) -> Self {
        Self {
            entry_path: entry_path.into(),
            payload,
            argv: Vec::new(),
        }
    }

    pub fn with_argv(mut self, argv: Vec<String>) -> Self {
        self.argv = argv;
        self
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SproutError::Other(e.into()))
    }
}

/// Something that can run a plugin entry and report its exit code.
pub trait Executable {
    fn run(&self, message: &InvocationMessage) -> Result<i32>;
}

/// Whether an entry needs the script runtime rather than being executable
/// itself.
pub fn is_script_entry(entry: &Path) -> bool {
    matches!(
        entry.extension().and_then(|e| e.to_str()),
        Some("js" | "cjs" | "mjs")
    )
}

/// Runs entries in a child process that receives the serialized message.
pub struct SubprocessRunner {
    runtime: String,
    process: Arc<dyn ProcessRunner>,
}

impl SubprocessRunner {
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            process: Arc::new(SystemRunner),
        }
    }

    /// Use a different process runner.
    pub fn with_process_runner(mut self, process: Arc<dyn ProcessRunner>) -> Self {
        self.process = process;
        self
    }
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME)
    }
}

impl Executable for SubprocessRunner {
    fn run(&self, message: &InvocationMessage) -> Result<i32> {
        let mut options = CommandOptions::default();
        options
            .env
            .insert(INVOCATION_ENV.to_string(), message.to_json()?);

        let entry = message.entry_path.to_string_lossy().into_owned();
        let code = if is_script_entry(&message.entry_path) {
            options
                .env
                .insert(BOOTSTRAP_ENV.to_string(), BOOTSTRAP.to_string());
            let args = vec!["-e".to_string(), BOOTSTRAP_LOADER.to_string()];
            self.process.run(&self.runtime, &args, &options)?
        } else {
            self.process.run(&entry, &message.argv, &options)?
        };

        debug!("{} exited with {:?}", entry, code);
        // A child killed by a signal has no code.
        Ok(code.unwrap_or(1))
    }
}

/// Runs entries with the raw argument array and no serialized context.
///
/// Failures are logged and reported as exit code 1 instead of propagating.
pub struct InlineRunner {
    runtime: String,
    process: Arc<dyn ProcessRunner>,
}

impl InlineRunner {
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            process: Arc::new(SystemRunner),
        }
    }

    pub fn with_process_runner(mut self, process: Arc<dyn ProcessRunner>) -> Self {
        self.process = process;
        self
    }

    fn try_run(&self, message: &InvocationMessage) -> Result<Option<i32>> {
        let entry = message.entry_path.to_string_lossy().into_owned();
        let options = CommandOptions::default();

        if is_script_entry(&message.entry_path) {
            let mut args = Vec::with_capacity(message.argv.len() + 1);
            args.push(entry);
            args.extend(message.argv.iter().cloned());
            self.process.run(&self.runtime, &args, &options)
        } else {
            self.process.run(&entry, &message.argv, &options)
        }
    }
}

impl Default for InlineRunner {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME)
    }
}

impl Executable for InlineRunner {
    fn run(&self, message: &InvocationMessage) -> Result<i32> {
        match self.try_run(message) {
            Ok(Some(0)) => Ok(0),
            Ok(code) => {
                warn!(
                    "{} failed with exit code {:?}",
                    message.entry_path.display(),
                    code
                );
                Ok(1)
            }
            Err(e) => {
                warn!("{}", e);
                Ok(1)
            }
        }
    }
}

/// The runner for an execution mode.
pub fn runner_for(mode: ExecutionMode, runtime: &str) -> Box<dyn Executable> {
    match mode {
        ExecutionMode::Subprocess => Box::new(SubprocessRunner::new(runtime)),
        ExecutionMode::Inline => Box::new(InlineRunner::new(runtime)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::wrap_for_platform;
    use serde_json::json;
    use std::sync::Mutex;

    type Call = (String, Vec<String>, CommandOptions);

    struct FakeProcess {
        code: Option<i32>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeProcess {
        fn exiting(code: Option<i32>) -> Arc<Self> {
            Arc::new(Self {
                code,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl ProcessRunner for FakeProcess {
        fn run(&self, program: &str, args: &[String], options: &CommandOptions) -> Result<Option<i32>> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec(), options.clone()));
            Ok(self.code)
        }
    }

    #[test]
    fn message_serializes_camel_case_without_argv() {
        let message = InvocationMessage::new("/p/index.js", json!({"command": "init"}))
            .with_argv(vec!["--force".to_string()]);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({"entryPath": "/p/index.js", "payload": {"command": "init"}})
        );
    }

    #[test]
    fn script_entries_go_through_bootstrap() {
        let process = FakeProcess::exiting(Some(0));
        let runner = SubprocessRunner::new("node").with_process_runner(process.clone());
        let message = InvocationMessage::new("/p/lib/index.js", json!({"args": []}));

        assert_eq!(runner.run(&message).unwrap(), 0);

        let calls = process.calls.lock().unwrap();
        let (program, args, options) = &calls[0];
        assert_eq!(program, "node");
        assert_eq!(args, &vec!["-e".to_string(), BOOTSTRAP_LOADER.to_string()]);
        assert_eq!(options.env[BOOTSTRAP_ENV], BOOTSTRAP);
        assert!(options.cwd.is_none());
        let sent: Value = serde_json::from_str(&options.env[INVOCATION_ENV]).unwrap();
        assert_eq!(sent["entryPath"], json!("/p/lib/index.js"));
    }

    #[test]
    fn bootstrap_command_line_survives_cmd_wrapping() {
        let process = FakeProcess::exiting(Some(0));
        let runner = SubprocessRunner::new("node").with_process_runner(process.clone());
        runner
            .run(&InvocationMessage::new("C:/p/index.js", json!({})))
            .unwrap();

        let calls = process.calls.lock().unwrap();
        let (program, args) = wrap_for_platform(&calls[0].0, &calls[0].1, true);
        assert_eq!(program, "cmd");
        assert!(args.iter().all(|arg| !arg.contains('\n') && !arg.contains(' ')));
        assert!(BOOTSTRAP_LOADER.contains(BOOTSTRAP_ENV));
    }

    #[test]
    fn subprocess_mirrors_exit_code() {
        let process = FakeProcess::exiting(Some(42));
        let runner = SubprocessRunner::default().with_process_runner(process);
        let message = InvocationMessage::new("/p/bin/tool", json!({}));
        assert_eq!(runner.run(&message).unwrap(), 42);
    }

    #[test]
    fn inline_passes_raw_args_and_no_context() {
        let process = FakeProcess::exiting(Some(0));
        let runner = InlineRunner::new("node").with_process_runner(process.clone());
        let message = InvocationMessage::new("/p/index.mjs", json!({}))
            .with_argv(vec!["a".to_string(), "--b".to_string()]);

        assert_eq!(runner.run(&message).unwrap(), 0);

        let calls = process.calls.lock().unwrap();
        assert_eq!(calls[0].0, "node");
        assert_eq!(calls[0].1, vec!["/p/index.mjs", "a", "--b"]);
        assert!(calls[0].2.env.is_empty());
    }

    #[test]
    fn inline_turns_failure_into_exit_one() {
        let process = FakeProcess::exiting(Some(7));
        let runner = InlineRunner::default().with_process_runner(process);
        let message = InvocationMessage::new("/p/bin/tool", json!({}));
        assert_eq!(runner.run(&message).unwrap(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn inline_swallows_spawn_error() {
        let message = InvocationMessage::new("/definitely/missing/tool", json!({}));
        assert_eq!(InlineRunner::default().run(&message).unwrap(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn subprocess_spawn_error_propagates() {
        let message = InvocationMessage::new("/definitely/missing/tool", json!({}));
        let err = SubprocessRunner::default().run(&message).unwrap_err();
        assert!(matches!(err, SproutError::SpawnError { .. }));
    }

    #[test]
    fn script_detection() {
        assert!(is_script_entry(Path::new("a/index.js")));
        assert!(is_script_entry(Path::new("a/index.cjs")));
        assert!(!is_script_entry(Path::new("a/bin/tool")));
        assert!(!is_script_entry(Path::new("a/run.sh")));
    }
}
