#![cfg(unix)]

// Changes the process working directory, so it lives in its own test binary
// and holds a single test.

use charm_core::Whitelist;
use charm_plugin::PluginRegistry;
use charm_scan::PathScanner;
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

fn write_plugin(dir: &Path, name: &str) {
    let path = dir.join(format!("charm-{name}"));
    let script = format!("#!/bin/sh\necho \"{name} --description\"\n");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[tokio::test]
async fn test_relative_cache_file_is_written_to_current_dir() {
    let temp = TempDir::new().unwrap();
    let bin = temp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    write_plugin(&bin, "foo");
    write_plugin(&bin, "bar");
    env::set_current_dir(temp.path()).unwrap();

    let registry = || {
        let whitelist: Whitelist = ["foo", "bar"].into_iter().collect();
        PluginRegistry::new(PathScanner::new([bin.clone()]), whitelist)
            .with_cache_file("relcache")
    };

    let first = registry().descriptions().await;
    assert!(!first.stats.all_cached());
    assert!(temp.path().join("relcache").is_file());

    let second = registry().descriptions().await;
    assert!(second.stats.all_cached());
    assert_eq!(first.entries, second.entries);
}
