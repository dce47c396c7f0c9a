//! The versioned package cache.
//!
//! Sub-commands and project templates are both npm-style packages. A
//! [`Package`] knows where one of them lives on disk, how to resolve its
//! version against the registry, and how to get it installed.
//!
//! # Layout
//!
//! ```text
//! ~/.sprout/dependencies/node_modules/
//! ├── _@sprout-cli_init@1.0.1@@sprout-cli/init/   (unix)
//! └── @sprout-cli/init/                          (windows)
//! ```

pub mod cache;
pub mod entry;
pub mod install;
pub mod layout;

pub use cache::{Package, PackageOptions, LATEST};
pub use entry::{find_manifest_dir, normalize_separators, resolve_entry, Manifest, MANIFEST_FILE};
pub use install::{copy_dir_all, InstallRequest, Installer, TarballInstaller};
pub use layout::{sanitize_name, CacheLayout};
