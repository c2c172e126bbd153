// src/vm/manager.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use crate::errors::Result;
use crate::events::EventHub;
use crate::exec::ProcessSupervisor;
use crate::protocol::Event;
use crate::types::DEFAULT_KILL_SIGNAL;

use super::core::{LifecycleCore, LifecycleEffect, VmConfig};

/// IO shell around [`LifecycleCore`].
///
/// Every transition runs under the core lock and its effects are applied
/// before the lock is released, so two racing `stopVM`/`startVM` calls can
/// never interleave their events. Lock order is core, then session table,
/// then subscribers.
#[derive(Debug)]
pub struct LifecycleManager {
    core: Mutex<LifecycleCore>,
    supervisor: Arc<ProcessSupervisor>,
    hub: EventHub,
    guest_connect_delay: Duration,
}

impl LifecycleManager {
    pub fn new(
        config: VmConfig,
        supervisor: Arc<ProcessSupervisor>,
        hub: EventHub,
        guest_connect_delay: Duration,
    ) -> Self {
        Self {
            core: Mutex::new(LifecycleCore::new(config)),
            supervisor,
            hub,
            guest_connect_delay,
        }
    }

    pub fn configure(&self, memory_mb: Option<u64>, cpu_count: Option<u32>) -> Result<()> {
        let mut core = self.lock();
        core.configure(memory_mb, cpu_count)?;
        let cfg = core.config();
        info!(
            memory_mb = cfg.memory_mb,
            cpu_count = cfg.cpu_count,
            "vm configuration updated"
        );
        Ok(())
    }

    pub fn create_vm(&self, bundle_path: &str, disk_size_gb: Option<u64>) {
        self.lock().create_vm(bundle_path, disk_size_gb);
        info!(bundle = %bundle_path, disk_size_gb = ?disk_size_gb, "vm bundle recorded");
    }

    pub fn start_vm(self: &Arc<Self>, bundle_path: &str, memory_gb: Option<u64>) {
        let mut core = self.lock();
        let effects = core.start_vm(bundle_path, memory_gb);
        if !effects.is_empty() {
            info!(bundle = %bundle_path, epoch = core.epoch(), "vm started");
        }
        self.apply(effects);
    }

    pub fn stop_vm(self: &Arc<Self>) {
        let mut core = self.lock();
        let effects = core.stop_vm();
        info!(epoch = core.epoch(), "vm stopped");
        self.apply(effects);
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_running()
    }

    pub fn is_guest_connected(&self) -> bool {
        self.lock().is_guest_connected()
    }

    pub fn config(&self) -> VmConfig {
        self.lock().config().clone()
    }

    /// Carry out `effects` in order. Called with the core lock held.
    fn apply(self: &Arc<Self>, effects: Vec<LifecycleEffect>) {
        for effect in effects {
            match effect {
                LifecycleEffect::ScheduleGuestConnect { epoch } => {
                    self.schedule_guest_connect(epoch);
                }
                LifecycleEffect::KillAllSessions => {
                    self.supervisor.kill_all(DEFAULT_KILL_SIGNAL);
                }
                LifecycleEffect::EmitNetworkStatus(status) => {
                    self.hub.broadcast(&Event::NetworkStatus { status });
                }
                LifecycleEffect::EmitApiReachability(status) => {
                    self.hub.broadcast(&Event::ApiReachability { status });
                }
            }
        }
    }

    fn schedule_guest_connect(self: &Arc<Self>, epoch: u64) {
        let manager = Arc::clone(self);
        let delay = self.guest_connect_delay;
        debug!(epoch, delay_ms = delay.as_millis() as u64, "guest handshake scheduled");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut core = manager.lock();
            let effects = core.guest_connected(epoch);
            if !effects.is_empty() {
                info!(epoch, "guest connected");
            }
            manager.apply(effects);
        });
    }

    fn lock(&self) -> MutexGuard<'_, LifecycleCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
