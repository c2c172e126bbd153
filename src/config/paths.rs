// src/config/paths.rs

//! Well-known filesystem locations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::model::DaemonConfig;

/// Name used for the socket file and the config/log directory.
pub const SERVICE_NAME: &str = "execd";

/// Runtime directory variable consulted for the socket location.
pub const RUNTIME_DIR_ENV: &str = "XDG_RUNTIME_DIR";

/// Socket path derived from the process environment.
pub fn default_socket_path() -> PathBuf {
    socket_path_in(std::env::var_os(RUNTIME_DIR_ENV))
}

/// Socket path for a given runtime directory value.
///
/// An unset or empty runtime directory falls back to a fixed directory under
/// the system temp dir.
pub fn socket_path_in(runtime_dir: Option<OsString>) -> PathBuf {
    let dir = match runtime_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir().join(format!("{SERVICE_NAME}-runtime")),
    };
    dir.join(format!("{SERVICE_NAME}.sock"))
}

/// CLI flag > config file > environment.
pub fn resolve_socket_path(cli: Option<&Path>, config: &DaemonConfig) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Some(path) = config.daemon.socket_path.as_ref() {
        return path.clone();
    }
    default_socket_path()
}

/// `<config dir>/execd`.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| home_dir().join(".config"))
        .join(SERVICE_NAME)
}

pub fn default_config_file() -> PathBuf {
    config_dir().join(format!("{SERVICE_NAME}.toml"))
}

pub fn default_log_file() -> PathBuf {
    config_dir().join("logs").join(format!("{SERVICE_NAME}.log"))
}

/// The user's home directory, or the temp dir when it cannot be determined.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(std::env::temp_dir)
}
