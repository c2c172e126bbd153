// src/logging.rs

//! Logging setup for `execd` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `EXECD_DEBUG` set to `1`/`true` forces `debug`
//! 3. `EXECD_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `info`
//!
//! The daemon is launched detached, so its standard streams usually go
//! nowhere. Logs are appended to a file under the user's config directory.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::fmt;

use crate::cli::LogLevel;
use crate::config::paths::default_log_file;

/// Environment toggle that forces debug logging.
pub const DEBUG_ENV: &str = "EXECD_DEBUG";
/// Environment variable naming an explicit log level.
pub const LEVEL_ENV: &str = "EXECD_LOG";

/// Initialise the global logging subscriber, writing to `log_file` (or the
/// default log location).
///
/// Safe to call once at startup. Returns the path actually used.
pub fn init_logging(cli_level: Option<LogLevel>, log_file: Option<&Path>) -> Result<PathBuf> {
    let level = resolve_level(
        cli_level,
        std::env::var(DEBUG_ENV).ok().as_deref(),
        std::env::var(LEVEL_ENV).ok().as_deref(),
    );

    let path = match log_file {
        Some(p) => p.to_path_buf(),
        None => default_log_file(),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {:?}", parent))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {:?}", path))?;

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_ansi(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(path)
}

/// Pick the effective level from the CLI flag and the two environment inputs.
pub fn resolve_level(
    cli_level: Option<LogLevel>,
    debug_toggle: Option<&str>,
    level_var: Option<&str>,
) -> tracing::Level {
    if let Some(lvl) = cli_level {
        return level_from_log_level(lvl);
    }
    if debug_toggle.is_some_and(is_truthy) {
        return tracing::Level::DEBUG;
    }
    level_var
        .and_then(parse_level_str)
        .unwrap_or(tracing::Level::INFO)
}

fn is_truthy(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
