// src/exec/sanitize.rs

//! Environment sanitizer.
//!
//! Turns what a caller asked for (environment, arguments, working directory)
//! into something that is safe to hand to a host process:
//!
//! - inherited variables that only mean something to the daemon itself or to
//!   the launching UI toolkit are removed,
//! - values pointing into the isolated filesystem namespace are stripped,
//!   because those paths do not exist on the host,
//! - the working directory always resolves to a real host directory.
//!
//! Every function here is total: unrecognised input passes through
//! unchanged.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use tracing::debug;

use crate::config::SandboxSection;
use crate::errors::{DaemonError, Result};
use crate::fs::FileSystem;

/// Does `value` name a path inside the isolated filesystem namespace?
///
/// Provisional heuristic: a literal prefix check against the sandbox root.
/// It stands in for a real isolation boundary and will have to change once
/// a guest filesystem exists.
pub fn is_sandbox_path(value: &str, root_prefix: &str) -> bool {
    let bare_root = root_prefix.trim_end_matches('/');
    value.starts_with(root_prefix) || (!bare_root.is_empty() && value == bare_root)
}

/// Join `subpath` under `base`, refusing anything that would leave `base`.
///
/// Absolute subpaths are refused as well; `.` components are ignored and
/// `..` is allowed as long as it stays inside `base`.
pub fn join_under(base: &Path, subpath: &str) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(subpath).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    let mut joined = base.to_path_buf();
    joined.extend(parts);
    Some(joined)
}

/// What a spawn will actually run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedLaunch {
    pub env: BTreeMap<String, String>,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

#[derive(Debug)]
pub struct Sanitizer {
    root_prefix: String,
    config_dir_var: String,
    nesting_marker: String,
    term: String,
    strip_env: GlobSet,
    mount_path: Regex,
    home: PathBuf,
}

impl Sanitizer {
    pub fn new(sandbox: &SandboxSection, home: PathBuf) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in sandbox.strip_env.iter() {
            let glob = Glob::new(pattern).map_err(|e| {
                DaemonError::ConfigError(format!("invalid strip_env pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
        let strip_env = builder
            .build()
            .map_err(|e| DaemonError::ConfigError(format!("building strip_env set: {e}")))?;

        let mount_path = Regex::new(&format!(
            "^{}[^/]+/mnt(?:/(.*))?$",
            regex::escape(&sandbox.root_prefix)
        ))
        .map_err(|e| DaemonError::ConfigError(format!("sandbox root prefix: {e}")))?;

        Ok(Self {
            root_prefix: sandbox.root_prefix.clone(),
            config_dir_var: sandbox.config_dir_var.clone(),
            nesting_marker: sandbox.nesting_marker.clone(),
            term: sandbox.term.clone(),
            strip_env,
            mount_path,
            home,
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn is_sandbox_path(&self, value: &str) -> bool {
        is_sandbox_path(value, &self.root_prefix)
    }

    /// Map `<root><session>/mnt/<rest>` to `$HOME/<rest>`.
    ///
    /// Other sandbox paths, and host paths, have no translation.
    pub fn translate_sandbox_path(&self, value: &str) -> Option<PathBuf> {
        let captures = self.mount_path.captures(value)?;
        match captures.get(1) {
            Some(rest) => join_under(&self.home, rest.as_str()),
            None => Some(self.home.clone()),
        }
    }

    /// Compute env, args and cwd for a launch.
    pub fn prepare(
        &self,
        fs: &dyn FileSystem,
        inherited: impl IntoIterator<Item = (String, String)>,
        requested_env: &BTreeMap<String, String>,
        args: &[String],
        cwd: Option<&str>,
        shared_cwd: Option<&str>,
    ) -> PreparedLaunch {
        PreparedLaunch {
            env: self.build_env(inherited, requested_env),
            args: self.filter_args(args),
            cwd: self.resolve_cwd(fs, cwd, shared_cwd),
        }
    }

    /// inherited (minus marker and toolkit variables)
    /// < requested (minus marker) < `TERM`.
    pub fn build_env(
        &self,
        inherited: impl IntoIterator<Item = (String, String)>,
        requested: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut env: BTreeMap<String, String> = inherited
            .into_iter()
            .filter(|(key, _)| key != &self.nesting_marker && !self.strip_env.is_match(key))
            .collect();

        for (key, value) in requested.iter() {
            if key == &self.nesting_marker {
                continue;
            }
            env.insert(key.clone(), value.clone());
        }

        if let Some(value) = requested.get(&self.config_dir_var) {
            if self.is_sandbox_path(value) {
                debug!(
                    var = %self.config_dir_var,
                    value = %value,
                    "dropping sandbox config directory; child falls back to its default"
                );
                env.remove(&self.config_dir_var);
            }
        }

        env.insert("TERM".to_string(), self.term.clone());
        env
    }

    /// Drop `--flag <sandbox path>` pairs and `--flag=<sandbox path>` args.
    pub fn filter_args(&self, args: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(args.len());
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];

            if is_flag(arg) {
                if let Some((_, value)) = arg.split_once('=') {
                    if self.is_sandbox_path(value) {
                        debug!(arg = %arg, "dropping sandbox path argument");
                        i += 1;
                        continue;
                    }
                } else if let Some(next) = args.get(i + 1) {
                    if self.is_sandbox_path(next) {
                        debug!(flag = %arg, value = %next, "dropping sandbox path flag pair");
                        i += 2;
                        continue;
                    }
                }
            }

            out.push(arg.clone());
            i += 1;
        }

        out
    }

    /// Shared cwd under home > home for sandbox cwd > existing cwd > home.
    pub fn resolve_cwd(
        &self,
        fs: &dyn FileSystem,
        cwd: Option<&str>,
        shared_cwd: Option<&str>,
    ) -> PathBuf {
        if let Some(shared) = shared_cwd.map(str::trim).filter(|s| !s.is_empty()) {
            let relative = shared.trim_start_matches('/');
            return join_under(&self.home, relative).unwrap_or_else(|| self.home.clone());
        }

        match cwd.map(str::trim).filter(|s| !s.is_empty()) {
            Some(dir) if self.is_sandbox_path(dir) => self.home.clone(),
            Some(dir) if fs.is_dir(Path::new(dir)) => PathBuf::from(dir),
            Some(dir) => {
                debug!(cwd = %dir, "requested cwd does not exist on host; using home");
                self.home.clone()
            }
            None => self.home.clone(),
        }
    }
}

fn is_flag(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-')
}
