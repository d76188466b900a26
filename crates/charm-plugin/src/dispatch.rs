//! Running plugins as subcommands.

use std::ffi::OsStr;
use std::process::ExitStatus;

use charm_core::{DispatchConfig, DispatchError, PluginDescriptor};
use charm_scan::PathScanner;
use tokio::process::Command;

/// What a command name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A command built into the CLI. Built-ins shadow plugins.
    Builtin(String),
    /// A plugin executable on the search path.
    Plugin(PluginDescriptor),
    /// Nothing answers to this name.
    NotFound,
}

/// Locates plugin executables by command name and runs them.
///
/// Lookup uses search path order and ignores the whitelist: a plugin the
/// user names explicitly always runs.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    scanner: PathScanner,
    /// Extra environment for every plugin run.
    env: Vec<(String, String)>,
}

impl Dispatcher {
    pub fn new(scanner: PathScanner) -> Self {
        Self {
            scanner,
            env: Vec::new(),
        }
    }

    /// Create a dispatcher from configuration, including injected variables.
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            scanner: PathScanner::from_config(config),
            env: config.env.clone(),
        }
    }

    /// Inject an environment variable into every plugin run.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn scanner(&self) -> &PathScanner {
        &self.scanner
    }

    /// Resolve a command name against the built-ins, then the search path.
    pub fn resolve(&self, name: &str, builtins: &[&str]) -> Resolution {
        if builtins.contains(&name) {
            return Resolution::Builtin(name.to_string());
        }
        match self.scanner.find(name) {
            Some(plugin) => Resolution::Plugin(plugin),
            None => Resolution::NotFound,
        }
    }

    /// Find and run the plugin for `name`, returning its exit code.
    pub async fn dispatch<I, S>(&self, name: &str, args: I) -> Result<i32, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let plugin = self
            .scanner
            .find(name)
            .ok_or_else(|| DispatchError::not_found(name))?;
        self.run(&plugin, args).await
    }

    /// Run a plugin with the given arguments, returning its exit code.
    ///
    /// The plugin shares this process's stdin, stdout and stderr and
    /// inherits its environment plus the configured extra variables.
    pub async fn run<I, S>(&self, plugin: &PluginDescriptor, args: I) -> Result<i32, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        tracing::debug!(plugin = %plugin.name, path = %plugin.path.display(), "running plugin");

        let status = Command::new(&plugin.path)
            .args(args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()
            .await
            .map_err(|e| DispatchError::spawn(&plugin.path, e))?;

        let code = exit_code(status);
        tracing::debug!(plugin = %plugin.name, code, "plugin exited");
        Ok(code)
    }
}

/// Map a child's exit status to the code this process should exit with.
///
/// A child killed by a signal maps to `128 + signal`, as shells report it.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::os::unix::process::ExitStatusExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_plugin(dir: &Path, name: &str, script: &str) {
        let path = dir.join(format!("charm-{name}"));
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
    }

    #[test]
    fn test_resolve_prefers_builtins() {
        let temp = TempDir::new().unwrap();
        write_plugin(temp.path(), "help", "#!/bin/sh\n");
        write_plugin(temp.path(), "foo", "#!/bin/sh\n");

        let dispatcher = Dispatcher::new(PathScanner::new([temp.path().to_path_buf()]));

        assert_eq!(
            dispatcher.resolve("help", &["help", "version"]),
            Resolution::Builtin("help".to_string())
        );
        assert!(matches!(
            dispatcher.resolve("foo", &["help"]),
            Resolution::Plugin(ref p) if p.name.as_str() == "foo"
        ));
        assert_eq!(dispatcher.resolve("missing", &["help"]), Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_dispatch_propagates_exit_code() {
        let temp = TempDir::new().unwrap();
        write_plugin(temp.path(), "fail", "#!/bin/sh\nexit 2\n");

        let dispatcher = Dispatcher::new(PathScanner::new([temp.path().to_path_buf()]));
        let code = dispatcher.dispatch("fail", ["some", "params"]).await.unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_dispatch_injects_environment() {
        let temp = TempDir::new().unwrap();
        write_plugin(
            temp.path(),
            "env",
            "#!/bin/sh\n[ \"$CHARM_TEST_ANSWER\" = 42 ] && exit 0\nexit 1\n",
        );

        let dispatcher = Dispatcher::new(PathScanner::new([temp.path().to_path_buf()]))
            .with_env("CHARM_TEST_ANSWER", "42");
        let code = dispatcher.dispatch("env", Vec::<String>::new()).await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_dispatch_not_found() {
        let temp = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new(PathScanner::new([temp.path().to_path_buf()]));

        let err = dispatcher.dispatch("nope", ["x"]).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
