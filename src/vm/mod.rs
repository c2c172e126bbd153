// src/vm/mod.rs

//! Simulated VM / guest lifecycle.
//!
//! There is no hypervisor behind this yet: processes run directly on the
//! host and the guest handshake is a timer. [`core`] holds the rules,
//! [`manager`] wires them to timers, sessions and events.

pub mod core;
pub mod manager;

pub use self::core::{LifecycleCore, LifecycleEffect, VmConfig, VmState};
pub use manager::LifecycleManager;
