//! The set of plugin names allowed to appear in listings.

use std::collections::BTreeSet;

use compact_str::CompactString;

/// Plugin names approved out of the box.
pub const DEFAULT_WHITELIST: &[&str] = &[
    "add",
    "build",
    "create",
    "help",
    "layers",
    "proof",
    "pull-source",
    "test",
    "version",
];

/// Approved plugin names.
///
/// Discovered plugins whose names are not in the whitelist are hidden from
/// `help plugins` and cannot be looked up as help topics. Running a plugin
/// by its explicit command name does not consult the whitelist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    names: BTreeSet<CompactString>,
}

impl Whitelist {
    /// Create an empty whitelist.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a whitelist seeded with [`DEFAULT_WHITELIST`].
    pub fn with_defaults() -> Self {
        let mut whitelist = Self::empty();
        whitelist.extend(DEFAULT_WHITELIST.iter().copied());
        whitelist
    }

    /// Check whether a plugin name is approved.
    pub fn is_allowed(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Approve additional names. Empty names are ignored.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() {
                self.names.insert(CompactString::new(name));
            }
        }
    }

    /// Iterate over approved names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Whitelist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut whitelist = Self::empty();
        whitelist.extend(iter);
        whitelist
    }
}
