// src/logging.rs

//! Logging setup for `assetmirror` using `tracing` + `tracing-subscriber`.
//!
//! Filter resolution, highest priority first:
//! 1. `--log-level` CLI flag
//! 2. `ASSETMIRROR_LOG` environment variable, in `EnvFilter` syntax
//!    (e.g. `"debug"` or `"assetmirror=debug,notify=warn"`)
//! 3. `info`
//!
//! Logs go to STDERR; STDOUT only carries the mirrored file paths.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "ASSETMIRROR_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let directives = filter_directives(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))
}

/// Pick the filter directives from the CLI level and the env value.
///
/// An env value that does not parse as an `EnvFilter` is ignored.
pub fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(lvl) = cli_level {
        return level_directive(lvl).to_string();
    }

    match env.map(str::trim) {
        Some(s) if !s.is_empty() && EnvFilter::try_new(s).is_ok() => s.to_string(),
        _ => DEFAULT_DIRECTIVES.to_string(),
    }
}

fn level_directive(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
