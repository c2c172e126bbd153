// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{DaemonConfig, RawDaemonConfig};
use crate::config::paths::default_config_file;
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawDaemonConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawDaemonConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawDaemonConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<DaemonConfig> {
    let raw_config = load_from_path(&path)?;
    let config = DaemonConfig::try_from(raw_config)?;
    Ok(config)
}

/// Load the config the daemon should run with.
///
/// - An explicit path must exist.
/// - Without one, the default location is tried and silently skipped when
///   the file is absent.
pub fn load_or_default(explicit: Option<&Path>) -> Result<DaemonConfig> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let path = default_config_file();
    if path.is_file() {
        debug!(path = %path.display(), "loading default config file");
        load_and_validate(&path)
    } else {
        debug!(path = %path.display(), "no config file; using defaults");
        Ok(DaemonConfig::default())
    }
}
