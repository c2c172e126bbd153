#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use execd::config::DaemonConfig;
use execd::daemon::Daemon;
use execd::fs::RealFileSystem;
use execd::server::Server;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::builders::DaemonConfigBuilder;
use crate::client::TestClient;

/// A daemon served on a socket inside a temporary directory, with its own
/// temporary home directory.
pub struct TestDaemon {
    pub daemon: Arc<Daemon>,
    socket_path: PathBuf,
    home: TempDir,
    _runtime_dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<execd::errors::Result<()>>>,
}

impl TestDaemon {
    pub async fn start() -> Result<Self> {
        Self::start_with(DaemonConfigBuilder::new().build()).await
    }

    pub async fn start_with(config: DaemonConfig) -> Result<Self> {
        let runtime_dir = TempDir::new()?;
        let home = TempDir::new()?;
        let socket_path = runtime_dir.path().join("execd.sock");

        let daemon = Daemon::with_fs(config, Arc::new(RealFileSystem), home.path().to_path_buf())
            .context("building daemon")?;
        let server = Server::bind(socket_path.clone(), Arc::clone(&daemon))
            .context("binding test socket")?;

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run(async move {
            let _ = rx.await;
            Ok(())
        }));

        Ok(Self {
            daemon,
            socket_path,
            home,
            _runtime_dir: runtime_dir,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }

    pub async fn client(&self) -> Result<TestClient> {
        TestClient::connect(&self.socket_path).await
    }

    /// Client that has already subscribed to events.
    pub async fn subscriber(&self) -> Result<TestClient> {
        let mut client = self.client().await?;
        client.call_ok("subscribeEvents", serde_json::json!({})).await?;
        Ok(client)
    }

    /// Trigger shutdown and wait for the server to finish cleaning up.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await??;
        }
        Ok(())
    }
}
