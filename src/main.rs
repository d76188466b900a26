//! charm - command dispatcher with PATH-discovered plugins.
//!
//! Usage:
//!   charm help                 List commands, built-in and plugin
//!   charm help plugins         Describe plugins and list the installed ones
//!   charm help <command>       Show help for a command
//!   charm <plugin> [ARGS...]   Run the plugin `charm-<plugin>`
//!   charm version              Print the version

mod help;

use std::ffi::OsString;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};

use charm_core::DispatchConfig;
use charm_plugin::Dispatcher;

#[derive(Parser)]
#[command(
    name = "charm",
    version,
    about = "Tools for charm authors",
    long_about = "charm runs its built-in commands and any plugin executable named \
                  `charm-<name>` found on the PATH.\n\n\
                  Run `charm help plugins` to see the installed plugins.",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Log debug output to stderr (overrides CHARM_LOG)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show help on a command or other topic.
    Help {
        /// Command name or topic (`plugins`)
        topic: Option<String>,
    },

    /// Print the version.
    Version,

    /// Run a plugin; every following argument is passed through untouched.
    #[command(external_subcommand)]
    External(Vec<OsString>),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = DispatchConfig::from_env().wrap_err("Cannot load charm settings")?;

    let code = match cli.command {
        Some(Command::Help { topic }) => help::run(&config, topic.as_deref()).await?,
        None => help::run(&config, None).await?,
        Some(Command::Version) => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            0
        }
        Some(Command::External(args)) => run_plugin(&config, args).await?,
    };

    Ok(exit_code(code))
}

/// Send logs to stderr, filtered by `CHARM_LOG` (default `warn`).
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_env("CHARM_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run `charm <name> [args...]` as the plugin `charm-<name>`.
async fn run_plugin(config: &DispatchConfig, args: Vec<OsString>) -> Result<i32> {
    let mut args = args.into_iter();
    let Some(name) = args.next() else {
        return Ok(0);
    };
    let name = name.to_string_lossy().into_owned();

    let dispatcher = Dispatcher::from_config(config);
    match dispatcher.dispatch(&name, args).await {
        Ok(code) => Ok(code),
        Err(err) if err.is_not_found() => {
            eprintln!("ERROR unrecognized command: charm {name}");
            Ok(2)
        }
        Err(err) => Err(err).wrap_err_with(|| format!("Cannot run plugin {name}")),
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
