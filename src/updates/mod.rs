//! Self-update notification.

pub mod version;

pub use version::{UpdateChecker, UpdateInfo, CORE_PACKAGE, VERSION};
