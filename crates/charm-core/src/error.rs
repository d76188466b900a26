//! Error types for plugin dispatch and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when running a plugin directly.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No executable on the search path matches the command name.
    #[error("unrecognized command: {name}")]
    NotFound { name: String },

    /// The plugin was found but could not be executed.
    #[error("cannot run plugin {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    /// Create a not-found error for a command name.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a spawn error with path context.
    pub fn spawn(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Spawn {
            path: path.into(),
            source,
        }
    }

    /// Whether this is the expected "no such command" condition rather than
    /// an execution failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has unexpected fields.
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The assembled configuration is inconsistent.
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    /// Create an invalid-configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_not_found() {
        let err = DispatchError::not_found("foo");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "unrecognized command: foo");
    }

    #[test]
    fn test_dispatch_error_spawn_keeps_source() {
        let err = DispatchError::spawn(
            "/usr/bin/charm-foo",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("/usr/bin/charm-foo"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
