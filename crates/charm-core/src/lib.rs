//! Core types and configuration for charm.
//!
//! This crate provides the data structures shared by the charm plugin
//! subsystem: plugin names and descriptors, the whitelist that gates plugin
//! listing, dispatch configuration, and the error types.

mod config;
mod error;
mod plugin;
mod whitelist;

pub use config::{
    DEFAULT_PLUGIN_PREFIX, DEFAULT_TOOLS_COMMAND, DispatchConfig, DispatchConfigBuilder, Settings,
};
pub use error::{ConfigError, DispatchError};
pub use plugin::{DescriptionEntry, PluginDescription, PluginDescriptor, PluginName};
pub use whitelist::{DEFAULT_WHITELIST, Whitelist};
