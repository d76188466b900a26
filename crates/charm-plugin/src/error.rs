//! Error types for the description cache.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or persisting the description cache.
///
/// None of these are fatal to a listing: a cache that cannot be read is
/// treated as empty and a cache that cannot be written is simply not
/// updated.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error reading or writing the cache file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file does not contain valid cache data.
    #[error("corrupt cache file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The cache file path has no parent directory to write into.
    #[error("invalid cache file location: {path}")]
    InvalidLocation { path: PathBuf },
}

impl CacheError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
