// src/server/listener.rs

//! Socket setup and teardown.

use std::io::{self, ErrorKind};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;

use tokio::net::UnixListener;
use tracing::{debug, info, warn};

use crate::errors::{DaemonError, Result};

/// Remove whatever sits at `path`. A missing file is fine.
///
/// Unconditional: a socket left behind by an unclean shutdown must never
/// block a fresh start.
pub fn remove_stale_socket(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "removed stale socket");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Remove the socket file on shutdown, logging instead of failing.
pub fn remove_socket_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "socket file removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove socket file"),
    }
}

/// Bind the daemon socket with owner-only permissions.
pub fn bind(path: &Path) -> Result<UnixListener> {
    remove_stale_socket(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(parent)?;
            debug!(dir = %parent.display(), "created socket directory");
        }
    }

    let listener =
        std::os::unix::net::UnixListener::bind(path).map_err(|e| bind_error(path, e))?;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;

    listener.set_nonblocking(true)?;
    let listener = UnixListener::from_std(listener)?;

    info!(path = %path.display(), "listening");
    Ok(listener)
}

/// `AddrInUse` maps to [`DaemonError::AddressInUse`] so the binary can exit
/// with its dedicated code.
fn bind_error(path: &Path, e: io::Error) -> DaemonError {
    if e.kind() == ErrorKind::AddrInUse {
        DaemonError::AddressInUse(path.to_path_buf())
    } else {
        e.into()
    }
}
