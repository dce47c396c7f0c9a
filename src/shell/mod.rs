//! Process spawning and host probes.

pub mod command;
pub mod platform;

pub use command::{split_command_line, wrap_for_platform, CommandOptions, ProcessRunner, SystemRunner};
pub use platform::{is_ci, is_elevated, needs_cmd_wrapper};
