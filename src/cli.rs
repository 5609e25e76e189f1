// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cronsync`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cronsync",
    version,
    about = "Prune and mirror a directory on a cron schedule, reporting failures to chat.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Edits are picked up without a restart.
    #[arg(long, value_name = "PATH", default_value = "cronsync.toml")]
    pub config: String,

    /// Run one sync immediately and exit, without cron or file watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CRONSYNC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config and print what would run, but run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
