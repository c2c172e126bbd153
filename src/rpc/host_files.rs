// src/rpc/host_files.rs

//! Handlers that touch the host filesystem: `mountPath`, `readFile` and
//! `installSdk`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{DaemonError, Result};
use crate::exec::{join_under, Sanitizer};
use crate::fs::FileSystem;
use crate::protocol::response::{InstallSdkResult, MountPathResult, ReadFileResult};
use crate::protocol::MAX_FRAME_SIZE;

/// Largest file `readFile` returns. Its content has to fit in one response
/// frame.
pub const MAX_READ_FILE_BYTES: u64 = MAX_FRAME_SIZE as u64;

#[derive(Debug, Clone)]
pub struct HostFiles {
    sanitizer: Arc<Sanitizer>,
    fs: Arc<dyn FileSystem>,
}

impl HostFiles {
    pub fn new(sanitizer: Arc<Sanitizer>, fs: Arc<dyn FileSystem>) -> Self {
        Self { sanitizer, fs }
    }

    /// Resolve `subpath` under the home directory. Nothing is persisted.
    pub fn mount_path(&self, name: &str, subpath: &str) -> Result<MountPathResult> {
        let home = self.sanitizer.home();
        let host_path = join_under(home, subpath).ok_or_else(|| {
            DaemonError::InvalidParams(format!(
                "mountPath: subpath '{subpath}' must be relative and stay inside {}",
                home.display()
            ))
        })?;

        debug!(name = %name, host_path = %host_path.display(), "mount path resolved");
        Ok(MountPathResult {
            name: name.to_string(),
            host_path: host_path.to_string_lossy().into_owned(),
        })
    }

    /// Map a caller path onto the host.
    ///
    /// - sandbox mount paths are translated to the home directory,
    /// - other sandbox paths are refused,
    /// - relative paths are taken relative to the home directory,
    /// - absolute host paths pass through.
    pub fn resolve_host_path(&self, path: &str) -> Result<PathBuf> {
        let path = path.trim();
        if path.is_empty() {
            return Err(DaemonError::InvalidParams("path must not be empty".to_string()));
        }

        if self.sanitizer.is_sandbox_path(path) {
            return self.sanitizer.translate_sandbox_path(path).ok_or_else(|| {
                DaemonError::NotFound(format!("{path} has no host equivalent"))
            });
        }

        if Path::new(path).is_absolute() {
            return Ok(PathBuf::from(path));
        }

        join_under(self.sanitizer.home(), path).ok_or_else(|| {
            DaemonError::InvalidParams(format!("path '{path}' escapes the home directory"))
        })
    }

    pub fn read_file(&self, path: &str) -> Result<ReadFileResult> {
        let host_path = self.resolve_host_path(path)?;
        if !self.fs.is_file(&host_path) {
            return Err(DaemonError::NotFound(host_path.display().to_string()));
        }

        let size = self.fs.file_len(&host_path)?;
        if size > MAX_READ_FILE_BYTES {
            return Err(DaemonError::FileTooLarge {
                path: host_path,
                size,
                limit: MAX_READ_FILE_BYTES,
            });
        }

        let bytes = self.fs.read(&host_path)?;
        debug!(path = %host_path.display(), bytes = bytes.len(), "file read");
        Ok(ReadFileResult {
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Check that `path` is an executable file and hash it.
    ///
    /// Recording it as the SDK binary is left to the caller.
    pub fn inspect_sdk(&self, path: &str, version: Option<&str>) -> Result<InstallSdkResult> {
        let host_path = self.resolve_host_path(path)?;
        if !self.fs.is_executable(&host_path) {
            return Err(DaemonError::NotFound(format!(
                "{} is not an executable file",
                host_path.display()
            )));
        }

        let bytes = self.fs.read(&host_path)?;
        let digest = blake3::hash(&bytes).to_hex().to_string();

        info!(
            path = %host_path.display(),
            version = version.unwrap_or("-"),
            digest = %digest,
            "SDK binary verified"
        );

        Ok(InstallSdkResult {
            path: host_path.to_string_lossy().into_owned(),
            digest,
            version: version.map(str::to_string),
        })
    }
}
