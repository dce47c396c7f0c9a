//! Sub-commands implemented by separately published packages.
//!
//! ```text
//! command ─► package name ─► cache (fetch or reuse) ─► entry ─► runner
//! ```
//!
//! The [`CommandDispatcher`] owns the first four steps; an [`Executable`]
//! runs the entry, either in a subprocess that receives the serialized
//! [`InvocationContext`] or inline with the raw arguments.

pub mod context;
pub mod dispatcher;
pub mod runner;

pub use context::InvocationContext;
pub use dispatcher::{CommandDispatcher, PluginDescriptor};
pub use runner::{
    is_script_entry, runner_for, Executable, ExecutionMode, InlineRunner, InvocationMessage,
    SubprocessRunner, BOOTSTRAP, BOOTSTRAP_ENV, BOOTSTRAP_LOADER, DEFAULT_RUNTIME, INVOCATION_ENV,
};
