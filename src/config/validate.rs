// src/config/validate.rs

use globset::Glob;

use crate::config::model::{DaemonConfig, RawDaemonConfig, SandboxSection, VmSection};
use crate::errors::{DaemonError, Result};

impl TryFrom<RawDaemonConfig> for DaemonConfig {
    type Error = crate::errors::DaemonError;

    fn try_from(raw: RawDaemonConfig) -> std::result::Result<Self, Self::Error> {
        validate_vm(&raw.vm)?;
        validate_sandbox(&raw.sandbox)?;
        Ok(DaemonConfig::new_unchecked(raw.daemon, raw.vm, raw.sandbox))
    }
}

fn validate_vm(vm: &VmSection) -> Result<()> {
    validate_memory_mb(vm.memory_mb)?;
    validate_cpu_count(vm.cpu_count)?;
    Ok(())
}

/// Range check shared by the config file and the `configure` RPC.
pub fn validate_memory_mb(memory_mb: u64) -> Result<()> {
    if memory_mb == 0 {
        return Err(DaemonError::ConfigError(
            "memory_mb must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// Range check shared by the config file and the `configure` RPC.
pub fn validate_cpu_count(cpu_count: u32) -> Result<()> {
    if cpu_count == 0 {
        return Err(DaemonError::ConfigError(
            "cpu_count must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_sandbox(sandbox: &SandboxSection) -> Result<()> {
    let prefix = &sandbox.root_prefix;
    if !prefix.starts_with('/') || !prefix.ends_with('/') || prefix.len() < 2 {
        return Err(DaemonError::ConfigError(format!(
            "[sandbox].root_prefix must be an absolute directory prefix ending in '/' (got '{}')",
            prefix
        )));
    }

    for pattern in sandbox.strip_env.iter() {
        Glob::new(pattern).map_err(|e| {
            DaemonError::ConfigError(format!(
                "[sandbox].strip_env contains invalid pattern '{}': {}",
                pattern, e
            ))
        })?;
    }

    if sandbox.config_dir_var.is_empty() || sandbox.nesting_marker.is_empty() {
        return Err(DaemonError::ConfigError(
            "[sandbox].config_dir_var and nesting_marker must not be empty".to_string(),
        ));
    }

    Ok(())
}
