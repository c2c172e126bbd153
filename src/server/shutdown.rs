// src/server/shutdown.rs

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use crate::errors::Result;

/// Resolve once SIGTERM or SIGINT arrives.
pub async fn wait_for_signal() -> Result<()> {
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = term.recv() => info!("SIGTERM received"),
        _ = int.recv() => info!("SIGINT received"),
    }
    Ok(())
}
