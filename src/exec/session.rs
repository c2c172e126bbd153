// src/exec/session.rs

//! Session records and the live session table.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nix::sys::signal::Signal;
use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::request::SpawnParams;

/// Canonical session id type (caller-assigned).
pub type SessionId = String;

/// One unit of work: a single spawned process, as the caller described it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub cwd: Option<String>,
    pub env: BTreeMap<String, String>,
    pub shared_cwd: Option<String>,
    pub one_shot: bool,
}

impl From<SpawnParams> for Session {
    fn from(p: SpawnParams) -> Self {
        Self {
            id: p.id,
            name: p.name,
            command: p.command,
            args: p.args,
            cwd: p.cwd,
            env: p.env,
            shared_cwd: p.shared_cwd,
            one_shot: p.one_shot,
        }
    }
}

/// Live bookkeeping for a session.
#[derive(Debug)]
pub(crate) struct SessionEntry {
    pub session: Session,
    pub generation: u64,
    /// `None` while the process is still being launched.
    pub pid: Option<u32>,
    /// `None` once stdin is closed (or for one-shot sessions).
    pub stdin: Option<UnboundedSender<Vec<u8>>>,
    /// Signal requested before the pid was known. Delivered once it is.
    pub pending_signal: Option<Signal>,
}

/// Sessions keyed by id. At most one live entry per id.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionTable {
    inner: Arc<Mutex<HashMap<SessionId, SessionEntry>>>,
}

impl SessionTable {
    pub fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove `id` only if it still belongs to `generation`.
    pub fn remove_generation(&self, id: &str, generation: u64) -> bool {
        let mut sessions = self.lock();
        match sessions.get(id) {
            Some(entry) if entry.generation == generation => {
                sessions.remove(id);
                true
            }
            _ => false,
        }
    }
}
