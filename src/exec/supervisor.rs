// src/exec/supervisor.rs

//! Process supervisor.
//!
//! Owns the live session table. `spawn` resolves and launches a process,
//! after which a background task (see [`session_runner`]) forwards its
//! output and reports its exit. All other operations are lookups in the
//! table.
//!
//! [`session_runner`]: crate::exec::session_runner

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::{DaemonError, Result};
use crate::events::EventHub;
use crate::exec::resolve::resolve_executable;
use crate::exec::sanitize::Sanitizer;
use crate::exec::session::{Session, SessionEntry, SessionTable};
use crate::exec::session_runner::{run_session, write_stdin_loop};
use crate::fs::FileSystem;
use crate::protocol::Event;
use crate::types::DEFAULT_KILL_SIGNAL;

/// Exit code reported when the command cannot be resolved.
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

#[derive(Debug)]
pub struct ProcessSupervisor {
    table: SessionTable,
    next_generation: AtomicU64,
    sanitizer: Arc<Sanitizer>,
    fs: Arc<dyn FileSystem>,
    hub: EventHub,
    sdk_binary: Mutex<Option<PathBuf>>,
}

impl ProcessSupervisor {
    pub fn new(sanitizer: Arc<Sanitizer>, fs: Arc<dyn FileSystem>, hub: EventHub) -> Self {
        Self {
            table: SessionTable::default(),
            next_generation: AtomicU64::new(1),
            sanitizer,
            fs,
            hub,
            sdk_binary: Mutex::new(None),
        }
    }

    /// Launch `session`.
    ///
    /// Only a duplicate id is an error. Resolution and launch failures are
    /// reported as events, because the caller has already been told the
    /// spawn was accepted.
    pub fn spawn(&self, session: Session) -> Result<()> {
        let id = session.id.clone();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        {
            let mut sessions = self.table.lock();
            if sessions.contains_key(&id) {
                warn!(id = %id, "spawn rejected: session id already live");
                return Err(DaemonError::SessionExists(id));
            }
            sessions.insert(
                id.clone(),
                SessionEntry {
                    session: session.clone(),
                    generation,
                    pid: None,
                    stdin: None,
                    pending_signal: None,
                },
            );
        }

        let inherited = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        let launch = self.sanitizer.prepare(
            self.fs.as_ref(),
            inherited,
            &session.env,
            &session.args,
            session.cwd.as_deref(),
            session.shared_cwd.as_deref(),
        );

        let sdk = self.sdk_binary();
        let resolution = resolve_executable(
            self.fs.as_ref(),
            sdk.as_deref(),
            &session.command,
            launch.env.get("PATH").map(String::as_str),
            &launch.cwd,
        );

        let Some(resolution) = resolution else {
            self.table.remove_generation(&id, generation);
            info!(id = %id, command = %session.command, "command not found");
            self.hub.broadcast(&Event::Stderr {
                id: id.clone(),
                data: format!("{}: command not found\n", session.command),
            });
            self.hub.broadcast(&Event::Exit {
                id,
                exit_code: Some(EXIT_COMMAND_NOT_FOUND),
                signal: None,
            });
            return Ok(());
        };

        let program = resolution.path().to_path_buf();
        let mut cmd = Command::new(&program);
        cmd.env_clear()
            .envs(&launch.env)
            .args(&launch.args)
            .current_dir(&launch.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.table.remove_generation(&id, generation);
                error!(
                    id = %id,
                    program = %program.display(),
                    error = %e,
                    "failed to launch process"
                );
                self.hub.broadcast(&Event::Error {
                    id,
                    message: format!("failed to launch {}: {e}", program.display()),
                });
                return Ok(());
            }
        };

        let pid = child.id();
        let stdin_tx = match child.stdin.take() {
            // Dropping the handle closes the child's input.
            Some(_) if session.one_shot => None,
            Some(stdin) => {
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(write_stdin_loop(stdin, id.clone(), rx));
                Some(tx)
            }
            None => None,
        };

        let deferred = {
            let mut sessions = self.table.lock();
            match sessions.get_mut(&id) {
                Some(entry) if entry.generation == generation => {
                    entry.pid = pid;
                    entry.stdin = stdin_tx;
                    entry.pending_signal.take()
                }
                // Dropped from the table by kill_all while launching. Nothing
                // else can reach this child, so stop it now.
                _ => Some(DEFAULT_KILL_SIGNAL),
            }
        };

        info!(
            id = %id,
            name = %session.name,
            pid = ?pid,
            program = %program.display(),
            resolution = ?resolution,
            cwd = %launch.cwd.display(),
            one_shot = session.one_shot,
            "session process started"
        );

        if let (Some(sig), Some(pid)) = (deferred, pid) {
            debug!(id = %id, pid, signal = %sig, "delivering signal requested during launch");
            send_signal(&id, pid, sig);
        }

        tokio::spawn(run_session(
            child,
            id,
            generation,
            self.table.clone(),
            self.hub.clone(),
        ));
        Ok(())
    }

    /// Send `sig` to the session's process. Unknown ids are a no-op.
    ///
    /// A session still being launched gets the signal as soon as its pid is
    /// known.
    pub fn kill(&self, id: &str, sig: Signal) {
        let pid = {
            let mut sessions = self.table.lock();
            match sessions.get_mut(id) {
                Some(entry) if entry.pid.is_none() => {
                    debug!(id = %id, signal = %sig, "session still launching; signal deferred");
                    entry.pending_signal = Some(sig);
                    return;
                }
                Some(entry) => entry.pid,
                None => None,
            }
        };
        match pid {
            Some(pid) => {
                debug!(id = %id, pid, signal = %sig, "signalling session process");
                send_signal(id, pid, sig);
            }
            None => debug!(id = %id, "kill for unknown session ignored"),
        }
    }

    /// Signal every live session and forget them all.
    ///
    /// Their exit events still arrive once the processes are reaped. Sessions
    /// caught mid-launch are stopped by `spawn` once their process exists.
    pub fn kill_all(&self, sig: Signal) -> usize {
        let drained: Vec<(String, SessionEntry)> = self.table.lock().drain().collect();
        for (id, entry) in drained.iter() {
            if let Some(pid) = entry.pid {
                debug!(id = %id, name = %entry.session.name, pid, "terminating session");
                send_signal(id, pid, sig);
            }
        }
        if !drained.is_empty() {
            info!(count = drained.len(), signal = %sig, "terminated all sessions");
        }
        drained.len()
    }

    /// Queue `data` for the session's stdin. Returns `false` when there is no
    /// open input to write to.
    pub fn write_stdin(&self, id: &str, data: &str) -> bool {
        let sessions = self.table.lock();
        let Some(tx) = sessions.get(id).and_then(|entry| entry.stdin.as_ref()) else {
            debug!(id = %id, "writeStdin without open input ignored");
            return false;
        };
        tx.send(data.as_bytes().to_vec()).is_ok()
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.table.lock().contains_key(id)
    }

    pub fn session_count(&self) -> usize {
        self.table.lock().len()
    }

    pub fn set_sdk_binary(&self, path: PathBuf) {
        info!(path = %path.display(), "SDK binary recorded");
        *self.sdk_binary.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
    }

    pub fn sdk_binary(&self) -> Option<PathBuf> {
        self.sdk_binary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn send_signal(id: &str, pid: u32, sig: Signal) {
    let Ok(raw) = i32::try_from(pid) else {
        warn!(id = %id, pid, "pid out of range; not signalling");
        return;
    };
    match signal::kill(Pid::from_raw(raw), sig) {
        Ok(()) => {}
        Err(Errno::ESRCH) => debug!(id = %id, pid, "process already gone"),
        Err(e) => warn!(id = %id, pid, signal = %sig, error = %e, "failed to signal process"),
    }
}
