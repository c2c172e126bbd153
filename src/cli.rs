// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! The daemon is normally launched detached by the desktop application with
//! no arguments at all; every flag here has a sensible default.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `execd`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "execd",
    version,
    about = "Local execution control-plane daemon.",
    long_about = None
)]
pub struct CliArgs {
    /// Path of the Unix socket to listen on.
    ///
    /// Default: `$XDG_RUNTIME_DIR/execd.sock`, or a fixed temp directory when
    /// `XDG_RUNTIME_DIR` is unset.
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Path to the config file (TOML).
    ///
    /// Default: `<config dir>/execd/execd.toml`; a missing default file is
    /// not an error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EXECD_DEBUG` / `EXECD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Append logs to this file instead of `<config dir>/execd/logs/execd.log`.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Resolve configuration, print the socket path and exit without binding.
    #[arg(long)]
    pub print_socket_path: bool,
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
