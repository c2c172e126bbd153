// src/lib.rs

pub mod cli;
pub mod config;
pub mod daemon;
pub mod errors;
pub mod events;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod protocol;
pub mod rpc;
pub mod server;
pub mod types;
pub mod vm;

use std::path::PathBuf;

use tracing::info;

use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::config::paths::resolve_socket_path;
use crate::daemon::Daemon;
use crate::errors::Result;
use crate::server::{wait_for_signal, Server};

/// High-level entry point used by `main.rs`.
///
/// Loads the configuration, builds the shared daemon state, binds the socket
/// and serves until SIGTERM/SIGINT.
pub async fn run(args: CliArgs) -> Result<()> {
    let config = load_or_default(args.config.as_deref())?;
    let socket_path = resolve_socket_path(args.socket.as_deref(), &config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        socket = %socket_path.display(),
        "execd starting"
    );

    let daemon = Daemon::new(config)?;
    let server = Server::bind(socket_path, daemon)?;
    server.run(wait_for_signal()).await
}

/// Socket path the daemon would bind with these arguments.
pub fn socket_path_for(args: &CliArgs) -> Result<PathBuf> {
    let config = load_or_default(args.config.as_deref())?;
    Ok(resolve_socket_path(args.socket.as_deref(), &config))
}
