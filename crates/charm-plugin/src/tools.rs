//! Whitelist extension through the reserved `tools-commands` plugin.
//!
//! If `charm-tools-commands` is installed it is run with no arguments and
//! its output names more plugins to whitelist, e.g. `["danger", "layers",]`.

use std::process::Stdio;

use charm_core::{DispatchConfig, Whitelist};
use charm_scan::PathScanner;
use tokio::process::Command;

/// Build the whitelist for this invocation: defaults, names from the
/// settings file, then names reported by the tools-commands plugin.
pub async fn build_whitelist(scanner: &PathScanner, config: &DispatchConfig) -> Whitelist {
    let mut whitelist = Whitelist::with_defaults();
    whitelist.extend(&config.whitelist);
    whitelist.extend(tool_commands(scanner, &config.tools_command).await);
    whitelist
}

/// Names reported by the tools-commands plugin.
///
/// Empty when the plugin is not installed, fails, or prints something that
/// is not a list of names.
pub async fn tool_commands(scanner: &PathScanner, tools_command: &str) -> Vec<String> {
    let Some(plugin) = scanner.find(tools_command) else {
        return Vec::new();
    };

    let output = Command::new(&plugin.path)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            match parse_command_list(&stdout) {
                Some(names) => {
                    tracing::debug!(count = names.len(), "whitelist extended by tools-commands");
                    names
                }
                None => {
                    tracing::warn!(output = %stdout.trim(), "ignoring malformed tools-commands output");
                    Vec::new()
                }
            }
        }
        Ok(output) => {
            tracing::warn!(status = %output.status, "tools-commands plugin failed");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!(path = %plugin.path.display(), error = %err, "cannot run tools-commands plugin");
            Vec::new()
        }
    }
}

/// Parse a bracketed list of quoted names: `["a", "b",]`.
///
/// A trailing comma is accepted. Returns `None` for anything else.
pub fn parse_command_list(output: &str) -> Option<Vec<String>> {
    let inner = output.trim().strip_prefix('[')?.strip_suffix(']')?;

    let mut names = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let name = item
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| item.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))?;
        if name.is_empty() || name.contains(['"', '\'']) {
            return None;
        }
        names.push(name.to_string());
    }
    Some(names)
}
