//! Plugin description caching, fetching and dispatch for charm.
//!
//! Plugins are stand-alone executables named `charm-<name>` somewhere on the
//! search path. This crate knows how to describe them and how to run them;
//! it never looks at what a plugin does.
//!
//! # Architecture
//!
//! - [`PluginRegistry`] lists whitelisted plugins with their one-line
//!   descriptions. Descriptions come from the [`DescriptionCache`] when the
//!   plugin file is unchanged, otherwise from a [`DescriptionFetcher`].
//!   All misses are fetched concurrently so plugins that wait on each other
//!   cannot deadlock the listing.
//! - [`Dispatcher`] resolves a command name to a built-in or a plugin and
//!   runs the plugin with the caller's streams and environment.
//! - [`tools`] runs the reserved `tools-commands` plugin to extend the
//!   whitelist.
//!
//! # Example
//!
//! ```ignore
//! use charm_core::DispatchConfig;
//! use charm_plugin::PluginRegistry;
//! use charm_scan::PathScanner;
//!
//! let config = DispatchConfig::from_env()?;
//! let scanner = PathScanner::from_config(&config);
//! let whitelist = charm_plugin::tools::build_whitelist(&scanner, &config).await;
//! let mut registry = PluginRegistry::from_config(&config, whitelist);
//!
//! for entry in registry.descriptions().await.entries {
//!     println!("{}  {}", entry.name, entry.description);
//! }
//! ```

mod cache;
mod dispatch;
mod error;
mod fetcher;
mod registry;
pub mod tools;

pub use cache::DescriptionCache;
pub use dispatch::{Dispatcher, Resolution};
pub use error::CacheError;
pub use fetcher::{BoxFuture, DESCRIPTION_FLAG, DescriptionFetcher, FetchedDescription, ProcessFetcher};
pub use registry::{Descriptions, FetchStats, PluginRegistry};
