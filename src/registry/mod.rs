//! Package registry access.
//!
//! - [`client`] - Blocking HTTP client for registry metadata
//! - [`version`] - Latest / caret-compatible version resolution

pub mod client;
pub mod version;

pub use client::{RegistryClient, DEFAULT_REGISTRY, REGISTRY_ENV};
pub use version::{max_satisfying, max_version, versions_from_metadata, VersionResolver};
