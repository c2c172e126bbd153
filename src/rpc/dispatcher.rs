// src/rpc/dispatcher.rs

//! Method dispatch.
//!
//! Every request produces exactly one [`Response`]. Handler failures are
//! turned into `{success:false, error}` here and never propagate to the
//! connection.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::Sender;
use tracing::{debug, warn};

use crate::daemon::Daemon;
use crate::errors::Result;
use crate::events::SubscriberId;
use crate::exec::Session;
use crate::protocol::response::{empty_object, ConnectedResult, RunningResult};
use crate::protocol::{RawRequest, Request, Response};
use crate::types::{parse_signal, DEFAULT_KILL_SIGNAL};

/// The connection a request arrived on.
#[derive(Debug, Clone)]
pub struct Caller {
    pub connection_id: SubscriberId,
    /// Frame queue of the connection's write task.
    pub frames: Sender<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    daemon: Arc<Daemon>,
}

impl Dispatcher {
    pub fn new(daemon: Arc<Daemon>) -> Self {
        Self { daemon }
    }

    pub fn daemon(&self) -> &Arc<Daemon> {
        &self.daemon
    }

    /// Decode and serve one request.
    pub fn handle_raw(&self, caller: &Caller, raw: RawRequest) -> Response {
        match Request::from_raw(raw) {
            Ok(request) => self.dispatch(caller, request),
            Err(e) => {
                warn!(connection = caller.connection_id, error = %e, "rejecting request");
                Response::err(e.to_string())
            }
        }
    }

    pub fn dispatch(&self, caller: &Caller, request: Request) -> Response {
        let method = request.method();
        debug!(connection = caller.connection_id, method, "dispatching request");

        match self.invoke(caller, request) {
            Ok(result) => Response::ok(result),
            Err(e) => {
                warn!(connection = caller.connection_id, method, error = %e, "request failed");
                Response::err(e.to_string())
            }
        }
    }

    fn invoke(&self, caller: &Caller, request: Request) -> Result<Value> {
        let daemon = &self.daemon;

        match request {
            Request::Configure(p) => {
                daemon.lifecycle.configure(p.memory_mb, p.cpu_count)?;
                Ok(empty_object())
            }
            Request::CreateVm(p) => {
                daemon.lifecycle.create_vm(&p.bundle_path, p.disk_size_gb);
                Ok(empty_object())
            }
            Request::StartVm(p) => {
                daemon.lifecycle.start_vm(&p.bundle_path, p.memory_gb);
                Ok(empty_object())
            }
            Request::StopVm => {
                daemon.lifecycle.stop_vm();
                Ok(empty_object())
            }
            Request::IsRunning => to_value(RunningResult {
                running: daemon.lifecycle.is_running(),
            }),
            Request::IsGuestConnected => to_value(ConnectedResult {
                connected: daemon.lifecycle.is_guest_connected(),
            }),
            Request::Spawn(p) => {
                daemon.supervisor.spawn(Session::from(p))?;
                Ok(empty_object())
            }
            Request::Kill(p) => {
                let signal = match p.signal.as_deref() {
                    Some(s) => parse_signal(s)?,
                    None => DEFAULT_KILL_SIGNAL,
                };
                daemon.supervisor.kill(&p.id, signal);
                Ok(empty_object())
            }
            Request::WriteStdin(p) => {
                daemon.supervisor.write_stdin(&p.id, &p.data);
                Ok(empty_object())
            }
            Request::IsProcessRunning(p) => to_value(RunningResult {
                running: daemon.supervisor.is_running(&p.id),
            }),
            Request::MountPath(p) => to_value(daemon.host_files.mount_path(&p.name, &p.subpath)?),
            Request::ReadFile(p) => to_value(daemon.host_files.read_file(&p.path)?),
            Request::InstallSdk(p) => {
                let installed = daemon
                    .host_files
                    .inspect_sdk(&p.path, p.version.as_deref())?;
                daemon.supervisor.set_sdk_binary(installed.path.clone().into());
                to_value(installed)
            }
            Request::AddApprovedOauthToken(p) => {
                daemon.credentials.approve(&p.token)?;
                Ok(empty_object())
            }
            Request::SubscribeEvents => {
                daemon
                    .hub
                    .subscribe(caller.connection_id, caller.frames.clone());
                Ok(empty_object())
            }
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
