//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CliDispatcher`], which routes CLI
//! subcommands to their implementations. Anything clap does not recognise
//! is an [`external::ExternalCommand`] served by a command package.

pub mod cache;
pub mod dispatcher;
pub mod external;
pub mod init;

pub use dispatcher::{CliDispatcher, Command, CommandResult};
