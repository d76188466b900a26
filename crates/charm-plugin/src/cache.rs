//! Persistent plugin description cache.
//!
//! Descriptions are keyed by the absolute plugin path and stamped with the
//! plugin's modification time. An entry whose stamp differs from the live
//! file is a miss, so reinstalling or editing a plugin forces a refetch.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use charm_core::DescriptionEntry;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Cache file format version. Files with another version are ignored.
const CACHE_VERSION: u32 = 1;

/// On-disk representation of the cache.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: BTreeMap<PathBuf, DescriptionEntry>,
}

/// Path-keyed, mtime-validated store of plugin descriptions.
#[derive(Debug, Clone, Default)]
pub struct DescriptionCache {
    /// Backing file. `None` keeps the cache in memory only.
    file: Option<PathBuf>,
    entries: BTreeMap<PathBuf, DescriptionEntry>,
    dirty: bool,
}

impl DescriptionCache {
    /// An in-memory cache that is never persisted.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// An empty cache that will be saved to `file`.
    pub fn at(file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::default()
        }
    }

    /// Load the cache from `file`.
    ///
    /// Never fails: a missing, unreadable or corrupt file yields an empty
    /// cache bound to the same location.
    pub fn load(file: &Path) -> Self {
        match Self::try_load(file) {
            Ok(cache) => cache,
            Err(CacheError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %file.display(), "no description cache yet");
                Self::at(file)
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable description cache");
                Self::at(file)
            }
        }
    }

    /// Load the cache from `file`, reporting why it could not be read.
    pub fn try_load(file: &Path) -> Result<Self, CacheError> {
        let content = fs::read(file).map_err(|e| CacheError::io(file, e))?;
        let parsed: CacheFile =
            serde_json::from_slice(&content).map_err(|source| CacheError::Corrupt {
                path: file.to_path_buf(),
                source,
            })?;

        let entries = if parsed.version == CACHE_VERSION {
            parsed.entries
        } else {
            tracing::debug!(
                found = parsed.version,
                expected = CACHE_VERSION,
                "discarding description cache with another format version"
            );
            BTreeMap::new()
        };

        Ok(Self {
            file: Some(file.to_path_buf()),
            entries,
            dirty: false,
        })
    }

    /// Backing file, if the cache is persisted.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Look up the description for `path`.
    ///
    /// Returns `None` if there is no entry or the entry was recorded for a
    /// different modification time.
    pub fn get(&self, path: &Path, modified: SystemTime) -> Option<&DescriptionEntry> {
        self.entries
            .get(path)
            .filter(|entry| entry.is_fresh(modified))
    }

    /// Insert or replace the entry for `path`.
    pub fn put(
        &mut self,
        path: impl Into<PathBuf>,
        modified: SystemTime,
        description: impl Into<String>,
        ok: bool,
    ) {
        self.entries
            .insert(path.into(), DescriptionEntry::new(modified, description, ok));
        self.dirty = true;
    }

    /// Drop entries whose plugin file no longer exists.
    ///
    /// Returns the number of entries removed.
    pub fn prune_missing(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|path, _| path.exists());
        let removed = before - self.entries.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Whether there are changes not yet written to disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the cache.
    ///
    /// The content is written to a temporary file next to the cache file and
    /// renamed over it, so readers never observe a partial file. A disabled
    /// cache saves nothing.
    pub fn save(&mut self) -> Result<(), CacheError> {
        let Some(file) = self.file.as_deref() else {
            return Ok(());
        };
        let dir = match file.parent() {
            // A bare file name lives in the current directory.
            Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
            Some(dir) => dir,
            None => {
                return Err(CacheError::InvalidLocation {
                    path: file.to_path_buf(),
                });
            }
        };
        fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;

        let snapshot = CacheFile {
            version: CACHE_VERSION,
            entries: self.entries.clone(),
        };
        let content = serde_json::to_vec(&snapshot).map_err(|source| CacheError::Corrupt {
            path: file.to_path_buf(),
            source,
        })?;

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CacheError::io(dir, e))?;
        temp.write_all(&content)
            .map_err(|e| CacheError::io(temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| CacheError::io(temp.path(), e))?;
        temp.persist(file)
            .map_err(|e| CacheError::io(file, e.error))?;

        self.dirty = false;
        tracing::debug!(path = %file.display(), entries = self.entries.len(), "saved description cache");
        Ok(())
    }
}
