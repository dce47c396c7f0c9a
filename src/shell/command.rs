//! Subprocess execution with inherited stdio.

use crate::error::{Result, SproutError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use super::platform::needs_cmd_wrapper;

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory (inherits the parent's when unset).
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,
}

impl CommandOptions {
    /// Options that run in `cwd`.
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            ..Default::default()
        }
    }
}

/// Rewrite a program invocation for the host shell rules.
///
/// With `windows` set the program is wrapped as `cmd /c <program> <args…>`
/// so `.cmd` shims such as `npm.cmd` resolve; otherwise it is unchanged.
pub fn wrap_for_platform(program: &str, args: &[String], windows: bool) -> (String, Vec<String>) {
    if windows {
        let mut wrapped = Vec::with_capacity(args.len() + 2);
        wrapped.push("/c".to_string());
        wrapped.push(program.to_string());
        wrapped.extend(args.iter().cloned());
        ("cmd".to_string(), wrapped)
    } else {
        (program.to_string(), args.to_vec())
    }
}

/// Split a command line on whitespace.
pub fn split_command_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

/// Something that can run a program to completion.
pub trait ProcessRunner {
    /// Run `program` with `args` and return its exit code (`None` when killed
    /// by a signal).
    fn run(&self, program: &str, args: &[String], options: &CommandOptions) -> Result<Option<i32>>;
}

/// Runs programs as real child processes sharing this process's terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], options: &CommandOptions) -> Result<Option<i32>> {
        let (program, args) = wrap_for_platform(program, args, needs_cmd_wrapper());
        debug!("Spawning {} {}", program, args.join(" "));

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &options.env {
            cmd.env(key, value);
        }

        let status = cmd
            .status()
            .map_err(|source| SproutError::SpawnError { program, source })?;

        debug!("Child exited with {:?}", status.code());
        Ok(status.code())
    }
}
