//! Plugin names, descriptors and cached description entries.

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Name of a plugin command, e.g. `foo` for the executable `charm-foo`.
///
/// Always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginName(CompactString);

impl PluginName {
    /// Create a plugin name. Returns `None` for an empty name.
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref();
        if name.is_empty() {
            None
        } else {
            Some(Self(CompactString::new(name)))
        }
    }

    /// Derive a plugin name from an executable file name by stripping the
    /// plugin prefix.
    ///
    /// Returns `None` when the file name does not carry the prefix or nothing
    /// remains after stripping it.
    pub fn from_file_name(file_name: &str, prefix: &str) -> Option<Self> {
        file_name.strip_prefix(prefix).and_then(Self::new)
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The executable file name for this plugin under the given prefix.
    pub fn command(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.0)
    }
}

impl fmt::Display for PluginName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A plugin executable found during a discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Plugin name (file name without the prefix).
    pub name: PluginName,
    /// Absolute path to the executable.
    pub path: PathBuf,
    /// Modification time of the executable when it was discovered.
    pub modified: SystemTime,
}

impl PluginDescriptor {
    /// Create a new descriptor.
    pub fn new(name: PluginName, path: impl Into<PathBuf>, modified: SystemTime) -> Self {
        Self {
            name,
            path: path.into(),
            modified,
        }
    }

    /// Base file name of the executable, e.g. `charm-foo`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A cached description keyed by plugin path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionEntry {
    /// Modification time of the executable the description was fetched from.
    pub modified: SystemTime,
    /// The one-line description (or the synthesized error text).
    pub description: String,
    /// Whether the plugin answered `--description` successfully.
    pub ok: bool,
}

impl DescriptionEntry {
    /// Create a new entry.
    pub fn new(modified: SystemTime, description: impl Into<String>, ok: bool) -> Self {
        Self {
            modified,
            description: description.into(),
            ok,
        }
    }

    /// Whether this entry is still valid for a plugin with the given live
    /// modification time.
    pub fn is_fresh(&self, modified: SystemTime) -> bool {
        self.modified == modified
    }
}

/// A plugin name paired with its description, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescription {
    pub name: PluginName,
    pub description: String,
}

impl PluginDescription {
    pub fn new(name: PluginName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
        }
    }
}
