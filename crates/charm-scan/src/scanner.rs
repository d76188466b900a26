//! Plugin executable discovery across search directories.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use charm_core::{DEFAULT_PLUGIN_PREFIX, DispatchConfig, PluginDescriptor, PluginName};

/// Finds plugin executables on an ordered list of directories.
#[derive(Debug, Clone)]
pub struct PathScanner {
    dirs: Vec<PathBuf>,
    prefix: String,
}

impl PathScanner {
    /// Create a scanner over the given directories using the default prefix.
    ///
    /// Empty entries are dropped and relative directories are resolved
    /// against the current directory.
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let dirs = dirs
            .into_iter()
            .filter(|d| !d.as_os_str().is_empty())
            .filter_map(|d| std::path::absolute(&d).ok())
            .collect();

        Self {
            dirs,
            prefix: DEFAULT_PLUGIN_PREFIX.to_string(),
        }
    }

    /// Create a scanner over the directories of the `PATH` variable.
    pub fn from_env() -> Self {
        let dirs: Vec<PathBuf> = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect())
            .unwrap_or_default();
        Self::new(dirs)
    }

    /// Create a scanner from dispatch configuration.
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.search_path.iter().cloned()).with_prefix(config.prefix.clone())
    }

    /// Use a different executable prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Directories searched, in order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Executable prefix, e.g. `charm-`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Enumerate every plugin executable on the search path.
    ///
    /// Results keep directory order. A name installed in several directories
    /// appears once per directory.
    pub fn scan(&self) -> Vec<PluginDescriptor> {
        self.dirs.iter().flat_map(|dir| self.scan_dir(dir)).collect()
    }

    /// Find the executable that runs for `name`: the first match in search
    /// path order.
    pub fn find(&self, name: &str) -> Option<PluginDescriptor> {
        if name.is_empty() || name.contains(std::path::is_separator) || name == ".." {
            return None;
        }
        let file_name = format!("{}{}", self.prefix, name);
        self.dirs
            .iter()
            .find_map(|dir| self.inspect(&dir.join(&file_name), &file_name))
    }

    /// Collect plugin executables in a single directory, ordered by file name.
    fn scan_dir(&self, dir: &Path) -> Vec<PluginDescriptor> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "skipping search directory");
                return Vec::new();
            }
        };

        let mut found: Vec<PluginDescriptor> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let file_name = entry.file_name().to_string_lossy().into_owned();
                if !file_name.starts_with(&self.prefix) {
                    return None;
                }
                self.inspect(&entry.path(), &file_name)
            })
            .collect();

        found.sort_by(|a, b| a.path.cmp(&b.path));
        found
    }

    /// Turn a candidate path into a descriptor if it is an executable
    /// regular file carrying the prefix.
    fn inspect(&self, path: &Path, file_name: &str) -> Option<PluginDescriptor> {
        let name = PluginName::from_file_name(file_name, &self.prefix)?;

        // Follows symlinks so linked installs are found.
        let metadata = fs::metadata(path).ok()?;
        if !metadata.is_file() || !is_executable(&metadata) {
            tracing::trace!(path = %path.display(), "not an executable file");
            return None;
        }

        let modified = metadata.modified().unwrap_or(std::time::UNIX_EPOCH);
        Some(PluginDescriptor::new(name, path, modified))
    }
}

impl Default for PathScanner {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Check if a file is executable (Unix).
///
/// Any execute bit counts. Whether the current user may actually run the
/// file is left to the spawn, which reports permission errors.
#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\necho hi\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_scan_finds_executables_with_prefix() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "charm-foo", 0o755);
        write_file(temp.path(), "charm-bar", 0o744);
        write_file(temp.path(), "other-baz", 0o755);

        let scanner = PathScanner::new([temp.path().to_path_buf()]);
        let names: Vec<String> = scanner.scan().iter().map(|p| p.name.to_string()).collect();

        assert_eq!(names, vec!["bar", "foo"]);
    }

    #[test]
    fn test_scan_skips_non_executable_and_directories() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "charm-foo", 0o644);
        write_file(temp.path(), "charm-bar", 0o666);
        fs::create_dir(temp.path().join("charm-dir")).unwrap();

        let scanner = PathScanner::new([temp.path().to_path_buf()]);
        assert!(scanner.scan().is_empty());
    }

    #[test]
    fn test_scan_accepts_any_execute_bit() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "charm-owner", 0o700);
        write_file(temp.path(), "charm-group", 0o610);
        write_file(temp.path(), "charm-other", 0o601);

        let scanner = PathScanner::new([temp.path().to_path_buf()]);
        let names: Vec<String> = scanner.scan().iter().map(|p| p.name.to_string()).collect();

        assert_eq!(names, vec!["group", "other", "owner"]);
    }

    #[test]
    fn test_scan_skips_bare_prefix() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "charm-", 0o755);

        let scanner = PathScanner::new([temp.path().to_path_buf()]);
        assert!(scanner.scan().is_empty());
    }

    #[test]
    fn test_scan_missing_directory_is_skipped() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "charm-foo", 0o755);

        let scanner = PathScanner::new([
            temp.path().join("does-not-exist"),
            PathBuf::new(),
            temp.path().to_path_buf(),
        ]);
        assert_eq!(scanner.dirs().len(), 2);
        assert_eq!(scanner.scan().len(), 1);
    }

    #[test]
    fn test_scan_keeps_directory_order_and_duplicates() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let first_foo = write_file(first.path(), "charm-foo", 0o755);
        write_file(second.path(), "charm-foo", 0o755);
        write_file(second.path(), "charm-aaa", 0o755);

        let scanner = PathScanner::new([first.path().to_path_buf(), second.path().to_path_buf()]);
        let found = scanner.scan();

        assert_eq!(found.len(), 3);
        assert_eq!(found[0].path, first_foo);
        assert_eq!(found[1].name.as_str(), "aaa");
        assert_eq!(found[2].name.as_str(), "foo");
    }

    #[test]
    fn test_find_first_match_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_file(first.path(), "charm-foo", 0o644);
        let second_foo = write_file(second.path(), "charm-foo", 0o755);

        let scanner = PathScanner::new([first.path().to_path_buf(), second.path().to_path_buf()]);
        let found = scanner.find("foo").unwrap();

        assert_eq!(found.path, second_foo);
        assert!(scanner.find("missing").is_none());
        assert!(scanner.find("../foo").is_none());
    }

    #[test]
    fn test_custom_prefix() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "juju-foo", 0o755);

        let scanner = PathScanner::new([temp.path().to_path_buf()]).with_prefix("juju-");
        assert_eq!(scanner.find("foo").unwrap().name.as_str(), "foo");
    }
}
