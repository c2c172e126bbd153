#![allow(dead_code)]

use std::collections::BTreeMap;

use execd::config::DaemonConfig;
use execd::protocol::request::SpawnParams;
use serde_json::Value;

/// Builder for `DaemonConfig` to simplify test setup.
///
/// Starts from the defaults with a short guest handshake delay.
pub struct DaemonConfigBuilder {
    config: DaemonConfig,
}

impl DaemonConfigBuilder {
    pub fn new() -> Self {
        let mut config = DaemonConfig::default();
        config.daemon.guest_connect_delay_ms = 50;
        Self { config }
    }

    pub fn guest_connect_delay_ms(mut self, ms: u64) -> Self {
        self.config.daemon.guest_connect_delay_ms = ms;
        self
    }

    pub fn memory_mb(mut self, mb: u64) -> Self {
        self.config.vm.memory_mb = mb;
        self
    }

    pub fn cpu_count(mut self, cpus: u32) -> Self {
        self.config.vm.cpu_count = cpus;
        self
    }

    pub fn root_prefix(mut self, prefix: &str) -> Self {
        self.config.sandbox.root_prefix = prefix.to_string();
        self
    }

    pub fn strip_env(mut self, pattern: &str) -> Self {
        self.config.sandbox.strip_env.push(pattern.to_string());
        self
    }

    pub fn build(self) -> DaemonConfig {
        self.config
    }
}

impl Default for DaemonConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `spawn` parameters.
pub struct SpawnParamsBuilder {
    params: SpawnParams,
}

impl SpawnParamsBuilder {
    pub fn new(id: &str, command: &str) -> Self {
        Self {
            params: SpawnParams {
                id: id.to_string(),
                name: id.to_string(),
                command: command.to_string(),
                args: vec![],
                cwd: None,
                env: BTreeMap::new(),
                shared_cwd: None,
                one_shot: false,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.params.args.push(arg.to_string());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.params.args.extend(args.iter().map(|a| a.to_string()));
        self
    }

    pub fn cwd(mut self, cwd: &str) -> Self {
        self.params.cwd = Some(cwd.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.params.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn shared_cwd(mut self, path: &str) -> Self {
        self.params.shared_cwd = Some(path.to_string());
        self
    }

    pub fn one_shot(mut self) -> Self {
        self.params.one_shot = true;
        self
    }

    pub fn build(self) -> SpawnParams {
        self.params
    }

    /// The params as they appear on the wire.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.params).expect("spawn params serialize")
    }
}
