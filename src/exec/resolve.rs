// src/exec/resolve.rs

//! Executable resolution for `spawn`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::FileSystem;

/// Where the binary for a launch came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The SDK binary recorded by `installSdk`.
    Sdk(PathBuf),
    /// `command` itself named an existing file.
    Direct(PathBuf),
    /// `command` was found on the search path.
    SearchPath(PathBuf),
}

impl Resolution {
    pub fn path(&self) -> &Path {
        match self {
            Resolution::Sdk(p) | Resolution::Direct(p) | Resolution::SearchPath(p) => p,
        }
    }
}

/// Resolve the program to launch, in priority order:
///
/// 1. the recorded SDK binary, if it exists and is executable;
/// 2. `command` as a path (it must contain a `/`), relative to `cwd` when
///    not absolute;
/// 3. `command` looked up on `search_path` (the child's `PATH`).
///
/// Returns `None` when nothing matches.
pub fn resolve_executable(
    fs: &dyn FileSystem,
    sdk_binary: Option<&Path>,
    command: &str,
    search_path: Option<&str>,
    cwd: &Path,
) -> Option<Resolution> {
    if let Some(sdk) = sdk_binary {
        if fs.is_executable(sdk) {
            return Some(Resolution::Sdk(sdk.to_path_buf()));
        }
        debug!(sdk = %sdk.display(), "recorded SDK binary is not executable; ignoring");
    }

    let command = command.trim();
    if command.is_empty() {
        return None;
    }

    if command.contains('/') {
        let candidate = Path::new(command);
        let candidate = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            cwd.join(candidate)
        };
        if fs.is_file(&candidate) {
            return Some(Resolution::Direct(candidate));
        }
    }

    let found = match search_path {
        Some(paths) => which::which_in(command, Some(paths), cwd),
        None => which::which(command),
    };

    match found {
        Ok(path) => Some(Resolution::SearchPath(path)),
        Err(e) => {
            debug!(command = %command, error = %e, "command not found on search path");
            None
        }
    }
}
