// src/config/mod.rs

//! Configuration loading and validation for execd.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate ranges and patterns (`validate.rs`).
//! - Resolve well-known filesystem locations (`paths.rs`).

pub mod loader;
pub mod model;
pub mod paths;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{DaemonConfig, DaemonSection, RawDaemonConfig, SandboxSection, VmSection};
