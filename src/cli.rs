// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetmirror`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetmirror",
    version,
    about = "Convert changed source assets and mirror them into an export tree.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// When omitted, `AssetMirror.toml` in the current working directory is
    /// used if it exists, otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory tree to watch for source assets (overrides `[paths].watch_root`).
    #[arg(long, value_name = "DIR")]
    pub watch_root: Option<PathBuf>,

    /// Destination tree for derived artifacts (overrides `[paths].mirror_root`).
    #[arg(long, value_name = "DIR")]
    pub mirror_root: Option<PathBuf>,

    /// Resync the whole watch tree once and exit, no watching.
    #[arg(long)]
    pub once: bool,

    /// Resync the whole watch tree before starting to watch.
    #[arg(long, conflicts_with = "once")]
    pub resync_on_start: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETMIRROR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate the config, print it, but don't convert anything.
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
