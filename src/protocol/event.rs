// src/protocol/event.rs

use serde::{Deserialize, Serialize};

use crate::types::{ApiReachability, NetworkStatus};

/// Asynchronous event pushed to subscribers.
///
/// Events travel in the same frames as responses and are told apart by the
/// `type` field, e.g. `{"type":"exit","id":"s1","exitCode":0,"signal":null}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Stdout {
        id: String,
        data: String,
    },
    Stderr {
        id: String,
        data: String,
    },
    #[serde(rename_all = "camelCase")]
    Exit {
        id: String,
        exit_code: Option<i32>,
        signal: Option<String>,
    },
    Error {
        id: String,
        message: String,
    },
    NetworkStatus {
        status: NetworkStatus,
    },
    ApiReachability {
        status: ApiReachability,
    },
}

impl Event {
    /// The value of the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Stdout { .. } => "stdout",
            Event::Stderr { .. } => "stderr",
            Event::Exit { .. } => "exit",
            Event::Error { .. } => "error",
            Event::NetworkStatus { .. } => "networkStatus",
            Event::ApiReachability { .. } => "apiReachability",
        }
    }

    /// Session the event belongs to, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Event::Stdout { id, .. }
            | Event::Stderr { id, .. }
            | Event::Exit { id, .. }
            | Event::Error { id, .. } => Some(id),
            Event::NetworkStatus { .. } | Event::ApiReachability { .. } => None,
        }
    }
}
