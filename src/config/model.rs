// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [daemon]
/// guest_connect_delay_ms = 500
///
/// [vm]
/// memory_mb = 4096
/// cpu_count = 2
///
/// [sandbox]
/// root_prefix = "/sessions/"
/// strip_env = ["ELECTRON_*", "CHROME_*"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawDaemonConfig {
    #[serde(default)]
    pub daemon: DaemonSection,

    #[serde(default)]
    pub vm: VmSection,

    #[serde(default)]
    pub sandbox: SandboxSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawDaemonConfig>` (see `validate.rs`) or
/// `Default`, so every field here satisfies the documented ranges.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub daemon: DaemonSection,
    pub vm: VmSection,
    pub sandbox: SandboxSection,
}

impl DaemonConfig {
    pub(crate) fn new_unchecked(
        daemon: DaemonSection,
        vm: VmSection,
        sandbox: SandboxSection,
    ) -> Self {
        Self {
            daemon,
            vm,
            sandbox,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::new_unchecked(
            DaemonSection::default(),
            VmSection::default(),
            SandboxSection::default(),
        )
    }
}

/// `[daemon]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonSection {
    /// Overrides the runtime-directory socket location.
    #[serde(default)]
    pub socket_path: Option<PathBuf>,

    /// Delay between entering `running` and reporting the guest as connected.
    #[serde(default = "default_guest_connect_delay_ms")]
    pub guest_connect_delay_ms: u64,
}

fn default_guest_connect_delay_ms() -> u64 {
    500
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            socket_path: None,
            guest_connect_delay_ms: default_guest_connect_delay_ms(),
        }
    }
}

/// `[vm]` section: initial values for the advisory VM configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct VmSection {
    #[serde(default = "default_memory_mb")]
    pub memory_mb: u64,

    #[serde(default = "default_cpu_count")]
    pub cpu_count: u32,
}

fn default_memory_mb() -> u64 {
    4096
}

fn default_cpu_count() -> u32 {
    2
}

impl Default for VmSection {
    fn default() -> Self {
        Self {
            memory_mb: default_memory_mb(),
            cpu_count: default_cpu_count(),
        }
    }
}

/// `[sandbox]` section: knobs for the environment sanitizer.
#[derive(Debug, Clone, Deserialize)]
pub struct SandboxSection {
    /// Literal prefix that marks a path as belonging to the isolated
    /// filesystem namespace.
    #[serde(default = "default_root_prefix")]
    pub root_prefix: String,

    /// Variable that points the spawned tool at its config directory.
    #[serde(default = "default_config_dir_var")]
    pub config_dir_var: String,

    /// Variable used by the launching tool to detect nesting; never forwarded.
    #[serde(default = "default_nesting_marker")]
    pub nesting_marker: String,

    /// Glob patterns of inherited variables that must not reach children.
    #[serde(default = "default_strip_env")]
    pub strip_env: Vec<String>,

    /// Value forced into `TERM` for every child.
    #[serde(default = "default_term")]
    pub term: String,
}

fn default_root_prefix() -> String {
    "/sessions/".to_string()
}

fn default_config_dir_var() -> String {
    "CLAUDE_CONFIG_DIR".to_string()
}

fn default_nesting_marker() -> String {
    "CLAUDECODE".to_string()
}

fn default_strip_env() -> Vec<String> {
    vec![
        "ELECTRON_*".to_string(),
        "CHROME_*".to_string(),
        "ORIGINAL_XDG_CURRENT_DESKTOP".to_string(),
    ]
}

fn default_term() -> String {
    "xterm-256color".to_string()
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            root_prefix: default_root_prefix(),
            config_dir_var: default_config_dir_var(),
            nesting_marker: default_nesting_marker(),
            strip_env: default_strip_env(),
            term: default_term(),
        }
    }
}
