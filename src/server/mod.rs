// src/server/mod.rs

//! Unix socket server.
//!
//! - [`listener`] binds the socket (single instance, owner-only).
//! - [`connection`] serves one client.
//! - [`shutdown`] waits for the termination signals.

pub mod connection;
pub mod listener;
pub mod shutdown;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UnixListener;
use tracing::{error, info};

use crate::daemon::Daemon;
use crate::errors::Result;
use crate::rpc::Dispatcher;

pub use connection::serve_connection;
pub use shutdown::wait_for_signal;

#[derive(Debug)]
pub struct Server {
    listener: UnixListener,
    socket_path: PathBuf,
    dispatcher: Dispatcher,
}

impl Server {
    pub fn bind(socket_path: PathBuf, daemon: Arc<Daemon>) -> Result<Self> {
        let listener = listener::bind(&socket_path)?;
        Ok(Self {
            listener,
            socket_path,
            dispatcher: Dispatcher::new(daemon),
        })
    }

    /// Accept clients until `shutdown` resolves, then stop every session,
    /// close the listener and remove the socket file.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        let Server {
            listener,
            socket_path,
            dispatcher,
        } = self;

        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                res = &mut shutdown => {
                    info!("shutdown requested");
                    break res;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        tokio::spawn(serve_connection(stream, dispatcher.clone()));
                    }
                    Err(e) => {
                        error!(error = %e, "accept failed");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                }
            }
        };

        dispatcher.daemon().shutdown();
        drop(listener);
        listener::remove_socket_file(&socket_path);
        info!(path = %socket_path.display(), "server stopped");

        outcome
    }
}
