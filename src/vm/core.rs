// src/vm/core.rs

//! Pure lifecycle state machine.
//!
//! `stopped --startVM--> running --stopVM--> stopped`, with `guest_connected`
//! as a sub-state of `running` that only becomes true once the delayed guest
//! handshake lands.
//!
//! The core holds no channels, timers or processes. Each transition returns
//! the [`LifecycleEffect`]s the IO shell (`vm::manager`) must carry out, so
//! every rule here can be unit tested synchronously.

use tracing::debug;

use crate::config::validate::{validate_cpu_count, validate_memory_mb};
use crate::config::VmSection;
use crate::errors::Result;
use crate::types::{ApiReachability, NetworkStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Stopped,
    Running,
}

/// Stored VM configuration. Advisory only; nothing enforces it yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    pub memory_mb: u64,
    pub cpu_count: u32,
    pub bundle_path: Option<String>,
    pub disk_size_gb: Option<u64>,
    /// Memory requested by the most recent `startVM`, if any.
    pub start_memory_gb: Option<u64>,
}

impl From<VmSection> for VmConfig {
    fn from(section: VmSection) -> Self {
        Self {
            memory_mb: section.memory_mb,
            cpu_count: section.cpu_count,
            bundle_path: None,
            disk_size_gb: None,
            start_memory_gb: None,
        }
    }
}

/// Work the IO shell has to perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEffect {
    /// Start the guest handshake timer; it reports back with this epoch.
    ScheduleGuestConnect { epoch: u64 },
    /// Terminate every live session.
    KillAllSessions,
    EmitNetworkStatus(NetworkStatus),
    EmitApiReachability(ApiReachability),
}

#[derive(Debug, Clone)]
pub struct LifecycleCore {
    state: VmState,
    guest_connected: bool,
    /// Bumped on every start and stop, so a handshake timer belonging to an
    /// earlier run is recognised and ignored.
    epoch: u64,
    config: VmConfig,
}

impl LifecycleCore {
    pub fn new(config: VmConfig) -> Self {
        Self {
            state: VmState::Stopped,
            guest_connected: false,
            epoch: 0,
            config,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.state == VmState::Running
    }

    pub fn is_guest_connected(&self) -> bool {
        self.state == VmState::Running && self.guest_connected
    }

    /// Merge the provided fields; absent ones stay as they are.
    ///
    /// Both values are checked before either is applied.
    pub fn configure(&mut self, memory_mb: Option<u64>, cpu_count: Option<u32>) -> Result<()> {
        if let Some(mb) = memory_mb {
            validate_memory_mb(mb)?;
        }
        if let Some(cpus) = cpu_count {
            validate_cpu_count(cpus)?;
        }
        if let Some(mb) = memory_mb {
            self.config.memory_mb = mb;
        }
        if let Some(cpus) = cpu_count {
            self.config.cpu_count = cpus;
        }
        Ok(())
    }

    /// Record the bundle. Idempotent and non-destructive.
    pub fn create_vm(&mut self, bundle_path: &str, disk_size_gb: Option<u64>) {
        self.config.bundle_path = Some(bundle_path.to_string());
        if disk_size_gb.is_some() {
            self.config.disk_size_gb = disk_size_gb;
        }
    }

    pub fn start_vm(&mut self, bundle_path: &str, memory_gb: Option<u64>) -> Vec<LifecycleEffect> {
        if self.state == VmState::Running {
            debug!(epoch = self.epoch, "startVM while running; no-op");
            return Vec::new();
        }

        self.config.bundle_path = Some(bundle_path.to_string());
        self.config.start_memory_gb = memory_gb;
        self.state = VmState::Running;
        self.guest_connected = false;
        self.epoch += 1;

        vec![LifecycleEffect::ScheduleGuestConnect { epoch: self.epoch }]
    }

    /// The handshake timer for `epoch` fired.
    pub fn guest_connected(&mut self, epoch: u64) -> Vec<LifecycleEffect> {
        if self.state != VmState::Running || epoch != self.epoch || self.guest_connected {
            debug!(
                epoch,
                current = self.epoch,
                state = ?self.state,
                "ignoring stale guest handshake"
            );
            return Vec::new();
        }

        self.guest_connected = true;
        vec![
            LifecycleEffect::EmitNetworkStatus(NetworkStatus::Connected),
            LifecycleEffect::EmitApiReachability(ApiReachability::Reachable),
        ]
    }

    /// Always tears sessions down and reports disconnection, even when the
    /// VM was not running.
    pub fn stop_vm(&mut self) -> Vec<LifecycleEffect> {
        self.state = VmState::Stopped;
        self.guest_connected = false;
        self.epoch += 1;

        vec![
            LifecycleEffect::KillAllSessions,
            LifecycleEffect::EmitNetworkStatus(NetworkStatus::Disconnected),
            LifecycleEffect::EmitApiReachability(ApiReachability::Unreachable),
        ]
    }
}
