// src/daemon.rs

//! Shared daemon state.
//!
//! One [`Daemon`] exists per process. It is built once at startup and handed
//! by `Arc` to every connection; there are no globals.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{paths, DaemonConfig};
use crate::errors::Result;
use crate::events::{EventHub, SubscriberId};
use crate::exec::{ProcessSupervisor, Sanitizer};
use crate::fs::{FileSystem, RealFileSystem};
use crate::rpc::{CredentialStore, HostFiles};
use crate::vm::{LifecycleManager, VmConfig};

#[derive(Debug)]
pub struct Daemon {
    pub config: DaemonConfig,
    pub hub: EventHub,
    pub supervisor: Arc<ProcessSupervisor>,
    pub lifecycle: Arc<LifecycleManager>,
    pub host_files: HostFiles,
    pub credentials: CredentialStore,
    next_connection_id: AtomicU64,
}

impl Daemon {
    /// Daemon backed by the real filesystem and the user's home directory.
    pub fn new(config: DaemonConfig) -> Result<Arc<Self>> {
        Self::with_fs(config, Arc::new(RealFileSystem), paths::home_dir())
    }

    pub fn with_fs(
        config: DaemonConfig,
        fs: Arc<dyn FileSystem>,
        home: PathBuf,
    ) -> Result<Arc<Self>> {
        let hub = EventHub::new();
        let sanitizer = Arc::new(Sanitizer::new(&config.sandbox, home)?);
        let supervisor = Arc::new(ProcessSupervisor::new(
            Arc::clone(&sanitizer),
            Arc::clone(&fs),
            hub.clone(),
        ));
        let lifecycle = Arc::new(LifecycleManager::new(
            VmConfig::from(config.vm),
            Arc::clone(&supervisor),
            hub.clone(),
            Duration::from_millis(config.daemon.guest_connect_delay_ms),
        ));
        info!(
            home = %sanitizer.home().display(),
            memory_mb = config.vm.memory_mb,
            cpu_count = config.vm.cpu_count,
            "daemon state initialised"
        );
        let host_files = HostFiles::new(sanitizer, fs);

        Ok(Arc::new(Self {
            config,
            hub,
            supervisor,
            lifecycle,
            host_files,
            credentials: CredentialStore::new(),
            next_connection_id: AtomicU64::new(1),
        }))
    }

    pub fn next_connection_id(&self) -> SubscriberId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Stop the lifecycle manager, which kills every session.
    pub fn shutdown(&self) {
        info!(sessions = self.supervisor.session_count(), "shutting down daemon state");
        self.lifecycle.stop_vm();
    }
}
