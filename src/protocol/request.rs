// src/protocol/request.rs

//! Typed requests.
//!
//! Decoding is two-step. The framer only requires `{method, params?}`
//! ([`RawRequest`]); [`Request::from_raw`] then maps the method name onto a
//! closed set of variants and deserializes `params` into the matching
//! struct. Unknown methods and ill-typed params are therefore reported as
//! structured errors instead of being discovered inside a handler.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::response::empty_object;

/// Minimal request shape accepted by the framer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl RawRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Every method the daemon serves.
pub const METHODS: &[&str] = &[
    "configure",
    "createVM",
    "startVM",
    "stopVM",
    "isRunning",
    "isGuestConnected",
    "spawn",
    "kill",
    "writeStdin",
    "isProcessRunning",
    "mountPath",
    "readFile",
    "installSdk",
    "addApprovedOauthToken",
    "subscribeEvents",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Configure(ConfigureParams),
    CreateVm(CreateVmParams),
    StartVm(StartVmParams),
    StopVm,
    IsRunning,
    IsGuestConnected,
    Spawn(SpawnParams),
    Kill(KillParams),
    WriteStdin(WriteStdinParams),
    IsProcessRunning(SessionIdParams),
    MountPath(MountPathParams),
    ReadFile(ReadFileParams),
    InstallSdk(InstallSdkParams),
    AddApprovedOauthToken(OauthTokenParams),
    SubscribeEvents,
}

/// Why a [`RawRequest`] could not become a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    UnknownMethod(String),
    InvalidParams { method: String, message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::UnknownMethod(name) => write!(f, "Unknown method: {name}"),
            RequestError::InvalidParams { method, message } => {
                write!(f, "Invalid params for {method}: {message}")
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl Request {
    pub fn from_raw(raw: RawRequest) -> Result<Self, RequestError> {
        let RawRequest { method, params } = raw;
        let params = if params.is_null() {
            empty_object()
        } else {
            params
        };

        let request = match method.as_str() {
            "configure" => Request::Configure(parse(&method, params)?),
            "createVM" => Request::CreateVm(parse(&method, params)?),
            "startVM" => Request::StartVm(parse(&method, params)?),
            "stopVM" => Request::StopVm,
            "isRunning" => Request::IsRunning,
            "isGuestConnected" => Request::IsGuestConnected,
            "spawn" => Request::Spawn(parse(&method, params)?),
            "kill" => Request::Kill(parse(&method, params)?),
            "writeStdin" => Request::WriteStdin(parse(&method, params)?),
            "isProcessRunning" => Request::IsProcessRunning(parse(&method, params)?),
            "mountPath" => Request::MountPath(parse(&method, params)?),
            "readFile" => Request::ReadFile(parse(&method, params)?),
            "installSdk" => Request::InstallSdk(parse(&method, params)?),
            "addApprovedOauthToken" => Request::AddApprovedOauthToken(parse(&method, params)?),
            "subscribeEvents" => Request::SubscribeEvents,
            _ => return Err(RequestError::UnknownMethod(method)),
        };
        Ok(request)
    }

    /// Wire name of the method.
    pub fn method(&self) -> &'static str {
        match self {
            Request::Configure(_) => "configure",
            Request::CreateVm(_) => "createVM",
            Request::StartVm(_) => "startVM",
            Request::StopVm => "stopVM",
            Request::IsRunning => "isRunning",
            Request::IsGuestConnected => "isGuestConnected",
            Request::Spawn(_) => "spawn",
            Request::Kill(_) => "kill",
            Request::WriteStdin(_) => "writeStdin",
            Request::IsProcessRunning(_) => "isProcessRunning",
            Request::MountPath(_) => "mountPath",
            Request::ReadFile(_) => "readFile",
            Request::InstallSdk(_) => "installSdk",
            Request::AddApprovedOauthToken(_) => "addApprovedOauthToken",
            Request::SubscribeEvents => "subscribeEvents",
        }
    }
}

fn parse<T: DeserializeOwned>(method: &str, params: Value) -> Result<T, RequestError> {
    serde_json::from_value(params).map_err(|e| RequestError::InvalidParams {
        method: method.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureParams {
    #[serde(default, rename = "memoryMB")]
    pub memory_mb: Option<u64>,
    #[serde(default, rename = "cpuCount")]
    pub cpu_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVmParams {
    #[serde(rename = "bundlePath")]
    pub bundle_path: String,
    #[serde(default, rename = "diskSizeGB")]
    pub disk_size_gb: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartVmParams {
    #[serde(rename = "bundlePath")]
    pub bundle_path: String,
    #[serde(default, rename = "memoryGB")]
    pub memory_gb: Option<u64>,
}

/// `spawn` parameters; the fields of a Session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnParams {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default, alias = "sharedCwdPath")]
    pub shared_cwd: Option<String>,
    #[serde(default)]
    pub one_shot: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillParams {
    pub id: String,
    #[serde(default)]
    pub signal: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStdinParams {
    pub id: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdParams {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountPathParams {
    pub name: String,
    pub subpath: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFileParams {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSdkParams {
    pub path: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OauthTokenParams {
    pub token: String,
}
