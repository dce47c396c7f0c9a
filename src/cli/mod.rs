//! Command-line interface for Sprout.
//!
//! This module provides the CLI argument parsing using clap's derive macros
//! and command implementations.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{CacheArgs, CacheSubcommand, Cli, Commands, InitArgs};
pub use commands::{CliDispatcher, Command, CommandResult};
