// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `semwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "semwatch",
    version,
    about = "Watch paths and print classified filesystem changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Paths to watch (files or directories, non-recursive).
    ///
    /// Default: `[watcher].paths` from the config, or `.`.
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `Semwatch.toml` in the current directory is used when it
    /// exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Milliseconds a bare create waits for a follow-up event.
    #[arg(long, value_name = "MS")]
    pub create_delay_ms: Option<u64>,

    /// Extra glob patterns to ignore (repeatable).
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SEMWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the configuration, but don't watch anything.
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
