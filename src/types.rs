// src/types.rs

//! Small shared types used by the protocol and the lifecycle manager.

use std::str::FromStr;

use nix::sys::signal::Signal;
use serde::{Deserialize, Serialize};

use crate::errors::DaemonError;

/// Payload of the `networkStatus` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Connected,
    Disconnected,
}

/// Payload of the `apiReachability` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiReachability {
    Reachable,
    Unreachable,
}

/// Signal used by `kill` when the caller does not name one.
pub const DEFAULT_KILL_SIGNAL: Signal = Signal::SIGTERM;

/// Parse a signal given as `"SIGTERM"`, `"term"` or `"15"`.
pub fn parse_signal(s: &str) -> Result<Signal, DaemonError> {
    let trimmed = s.trim();

    if let Ok(num) = trimmed.parse::<i32>() {
        return Signal::try_from(num).map_err(|_| DaemonError::InvalidSignal(s.to_string()));
    }

    let upper = trimmed.to_ascii_uppercase();
    let name = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{upper}")
    };

    Signal::from_str(&name).map_err(|_| DaemonError::InvalidSignal(s.to_string()))
}

/// Name reported in the `exit` event for a raw signal number.
pub fn signal_name(raw: i32) -> String {
    match Signal::try_from(raw) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => raw.to_string(),
    }
}
