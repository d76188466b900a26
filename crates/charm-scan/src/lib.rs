//! Search path scanning for charm plugins.
//!
//! This crate enumerates plugin executables (`charm-<name>`) across the
//! directories of a `PATH`-like search path.
//!
//! # Overview
//!
//! - **Ordered**: results follow search path order, so the first match for
//!   a name is the one that would run
//! - **Forgiving**: missing directories, unreadable entries and files that
//!   are not executable are skipped, never reported as errors
//!
//! # Example
//!
//! ```rust,no_run
//! use charm_scan::PathScanner;
//!
//! let scanner = PathScanner::from_env();
//! for plugin in scanner.scan() {
//!     println!("{} -> {}", plugin.name, plugin.path.display());
//! }
//!
//! if let Some(foo) = scanner.find("foo") {
//!     println!("charm foo runs {}", foo.path.display());
//! }
//! ```

mod scanner;

pub use scanner::PathScanner;

// Re-export core types for convenience
pub use charm_core::{DEFAULT_PLUGIN_PREFIX, PluginDescriptor, PluginName};
