//! The `help` built-in: command overview, the `plugins` topic and per-command
//! help.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use clap::CommandFactory;
use color_eyre::eyre::{Context, Result};

use charm_core::{DispatchConfig, PluginDescription};
use charm_plugin::{Dispatcher, PluginRegistry, Resolution, tools};
use charm_scan::PathScanner;

use crate::Cli;

/// Introduction printed by `charm help plugins` before the plugin list.
pub const PLUGIN_TOPIC_TEXT: &str = "\
Plugins are executables named charm-<name> found on the PATH. They extend
charm with new commands: `charm <name> [args...]` runs `charm-<name>` with
the remaining arguments, and `charm help <name>` shows the plugin's own help.

Only approved plugins are listed. Each describes itself when run with
--description.

";

/// Commands handled by charm itself, with their one-line purpose.
const BUILTINS: &[(&str, &str)] = &[
    ("help", "Show help on a command or other topic."),
    ("version", "Print the version."),
];

/// Width of the name column in the command overview.
const NAME_COLUMN: usize = 20;

/// Run `charm help [topic]` and return the process exit code.
pub async fn run(config: &DispatchConfig, topic: Option<&str>) -> Result<i32> {
    match topic {
        None => {
            let plugins = plugin_descriptions(config).await;
            print!("{}", render_overview(&plugins));
            Ok(0)
        }
        Some("plugins") => {
            let plugins = plugin_descriptions(config).await;
            print!("{PLUGIN_TOPIC_TEXT}{}", render_plugin_list(&plugins));
            Ok(0)
        }
        Some(name) => command_help(config, name).await,
    }
}

/// Help for one command: clap's long help for a built-in, `--help` output
/// for an approved plugin.
async fn command_help(config: &DispatchConfig, name: &str) -> Result<i32> {
    let dispatcher = Dispatcher::from_config(config);
    let builtins: Vec<&str> = BUILTINS.iter().map(|(name, _)| *name).collect();

    match dispatcher.resolve(name, &builtins) {
        Resolution::Builtin(name) => {
            let mut cli = Cli::command();
            cli.build();
            if let Some(sub) = cli.find_subcommand_mut(&name) {
                sub.print_long_help().wrap_err("Cannot print help")?;
            }
            Ok(0)
        }
        Resolution::Plugin(plugin) => {
            let whitelist = tools::build_whitelist(dispatcher.scanner(), config).await;
            if !whitelist.is_allowed(plugin.name.as_str()) {
                tracing::debug!(plugin = %plugin.name, "plugin is not approved for help");
                return Ok(unknown_topic(name));
            }
            dispatcher
                .run(&plugin, ["--help"])
                .await
                .wrap_err_with(|| format!("Cannot run plugin {name}"))
        }
        Resolution::NotFound => Ok(unknown_topic(name)),
    }
}

fn unknown_topic(name: &str) -> i32 {
    eprintln!("ERROR unknown command or topic for {name}");
    1
}

/// Descriptions of every approved plugin, sorted by name.
async fn plugin_descriptions(config: &DispatchConfig) -> Vec<PluginDescription> {
    let scanner = PathScanner::from_config(config);
    let whitelist = tools::build_whitelist(&scanner, config).await;
    let mut registry = PluginRegistry::from_config(config, whitelist);

    let descriptions = registry.descriptions().await;
    tracing::debug!(
        plugins = descriptions.entries.len(),
        from_cache = descriptions.stats.all_cached(),
        "listed plugins"
    );
    descriptions.entries
}

/// Two-column plugin list, names padded to the longest name plus two.
fn render_plugin_list(plugins: &[PluginDescription]) -> String {
    if plugins.is_empty() {
        return "No plugins found.\n".to_string();
    }

    let width = plugins
        .iter()
        .map(|p| p.name.as_str().len())
        .max()
        .unwrap_or(0)
        + 2;

    let mut out = String::new();
    for plugin in plugins {
        let _ = writeln!(out, "{:<width$}{}", plugin.name.as_str(), plugin.description);
    }
    out
}

/// Usage and the combined command table. Built-ins replace plugins of the
/// same name.
fn render_overview(plugins: &[PluginDescription]) -> String {
    let mut commands: BTreeMap<&str, &str> = plugins
        .iter()
        .map(|p| (p.name.as_str(), p.description.as_str()))
        .collect();
    for (name, purpose) in BUILTINS {
        commands.insert(name, purpose);
    }

    let mut out = String::from(
        "Usage: charm [-v] <command> [args...]\n\n\
         charm is a tool for charm authors. Run `charm help <command>` for help\n\
         on a command, or `charm help plugins` for more about plugins.\n\n\
         Commands:\n",
    );
    for (name, purpose) in commands {
        let _ = writeln!(out, "    {name:<NAME_COLUMN$}- {purpose}");
    }
    out
}
