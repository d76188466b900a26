//! Fetching one-line descriptions from plugin executables.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use charm_core::PluginDescriptor;
use tokio::process::Command;

/// Argument asking a plugin for its one-line description.
pub const DESCRIPTION_FLAG: &str = "--description";

/// Type alias for boxed futures returned by fetchers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of asking a plugin for its description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDescription {
    /// Description text, or the synthesized error line when `ok` is false.
    pub description: String,
    /// Whether the plugin ran and exited successfully.
    pub ok: bool,
}

impl FetchedDescription {
    /// A description reported by the plugin.
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ok: true,
        }
    }

    /// The stand-in description for a plugin that could not describe itself.
    pub fn failure(plugin: &PluginDescriptor) -> Self {
        Self {
            description: format!(
                "error occurred running '{} {}'",
                plugin.file_name(),
                DESCRIPTION_FLAG
            ),
            ok: false,
        }
    }
}

/// Source of plugin descriptions.
///
/// Implementations must not serialize fetches: the registry polls every
/// fetch at once and plugins may depend on each other having started.
pub trait DescriptionFetcher: Send + Sync {
    /// Describe a plugin. Failures are reported as data, never as errors.
    fn fetch<'a>(&'a self, plugin: &'a PluginDescriptor) -> BoxFuture<'a, FetchedDescription>;
}

/// Fetches descriptions by running `<plugin> --description`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessFetcher;

impl ProcessFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl DescriptionFetcher for ProcessFetcher {
    fn fetch<'a>(&'a self, plugin: &'a PluginDescriptor) -> BoxFuture<'a, FetchedDescription> {
        Box::pin(async move {
            let output = Command::new(&plugin.path)
                .arg(DESCRIPTION_FLAG)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await;

            match output {
                Ok(output) if output.status.success() => {
                    FetchedDescription::success(normalize_output(&output.stdout))
                }
                Ok(output) => {
                    tracing::debug!(
                        plugin = %plugin.name,
                        status = %output.status,
                        stderr = %String::from_utf8_lossy(&output.stderr).trim_end(),
                        "plugin description failed"
                    );
                    FetchedDescription::failure(plugin)
                }
                Err(err) => {
                    tracing::debug!(
                        plugin = %plugin.name,
                        path = %plugin.path.display(),
                        error = %err,
                        "cannot start plugin"
                    );
                    FetchedDescription::failure(plugin)
                }
            }
        })
    }
}

/// Decode captured output and strip the trailing line break.
fn normalize_output(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use charm_core::PluginName;
    use std::time::SystemTime;

    fn descriptor(path: &str) -> PluginDescriptor {
        PluginDescriptor::new(PluginName::new("foo").unwrap(), path, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn test_normalize_strips_trailing_newlines() {
        assert_eq!(normalize_output(b"foo --description\n"), "foo --description");
        assert_eq!(normalize_output(b"foo\r\n"), "foo");
        assert_eq!(normalize_output(b""), "");
    }

    #[test]
    fn test_failure_text() {
        let failed = FetchedDescription::failure(&descriptor("/opt/bin/charm-foo"));
        assert!(!failed.ok);
        assert_eq!(
            failed.description,
            "error occurred running 'charm-foo --description'"
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_failure() {
        let plugin = descriptor("/nonexistent/dir/charm-foo");
        let fetched = ProcessFetcher::new().fetch(&plugin).await;
        assert_eq!(fetched, FetchedDescription::failure(&plugin));
    }
}
