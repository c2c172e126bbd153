// src/exec/session_runner.rs

//! Per-process I/O: stream forwarding, stdin writing and reaping.

use std::os::unix::process::ExitStatusExt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::events::EventHub;
use crate::exec::session::SessionTable;
use crate::protocol::Event;
use crate::types::signal_name;

/// How long to keep draining output after the process itself has exited.
///
/// Bounded because a grandchild may inherit the pipes and hold them open
/// indefinitely.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    fn event(self, id: &str, data: String) -> Event {
        match self {
            StreamKind::Stdout => Event::Stdout {
                id: id.to_string(),
                data,
            },
            StreamKind::Stderr => Event::Stderr {
                id: id.to_string(),
                data,
            },
        }
    }
}

/// Converts arbitrary byte chunks into text without splitting a UTF-8
/// sequence across two events.
///
/// An incomplete sequence at the end of a chunk is held back until the next
/// chunk; genuinely invalid bytes are replaced.
#[derive(Debug, Default)]
pub struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let keep = incomplete_tail_len(&self.pending);
        let tail = self.pending.split_off(self.pending.len() - keep);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = tail;
        text
    }

    /// Flush whatever is held back (at end of stream).
    pub fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Length of a trailing, not-yet-complete UTF-8 sequence.
fn incomplete_tail_len(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - back];
        if b & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let needed = match b {
            0xF0..=0xFF => 4,
            0xE0..=0xEF => 3,
            0xC0..=0xDF => 2,
            _ => 1,
        };
        return if needed > back { back } else { 0 };
    }
    0
}

/// Own `child` until it exits, then report the `exit` event.
///
/// Output readers are drained before the exit event is sent so that, for a
/// given session, every `stdout`/`stderr` event precedes its `exit`.
pub(crate) async fn run_session(
    mut child: Child,
    id: String,
    generation: u64,
    table: SessionTable,
    hub: EventHub,
) {
    let stdout_task = child
        .stdout
        .take()
        .map(|s| tokio::spawn(forward_stream(s, id.clone(), StreamKind::Stdout, hub.clone())));
    let stderr_task = child
        .stderr
        .take()
        .map(|s| tokio::spawn(forward_stream(s, id.clone(), StreamKind::Stderr, hub.clone())));

    let status = child.wait().await;

    for task in [stdout_task, stderr_task].into_iter().flatten() {
        let abort = task.abort_handle();
        if timeout(DRAIN_GRACE, task).await.is_err() {
            warn!(id = %id, "output still open after process exit; abandoning reader");
            abort.abort();
        }
    }

    table.remove_generation(&id, generation);

    match status {
        Ok(status) => {
            let exit_code = status.code();
            let signal = status.signal().map(signal_name);
            info!(
                id = %id,
                exit_code = ?exit_code,
                signal = ?signal,
                "session process exited"
            );
            hub.broadcast(&Event::Exit {
                id,
                exit_code,
                signal,
            });
        }
        Err(e) => {
            error!(id = %id, error = %e, "waiting for session process failed");
            hub.broadcast(&Event::Error {
                id,
                message: format!("waiting for process: {e}"),
            });
        }
    }
}

/// Forward a child stream to subscribers chunk by chunk.
pub(crate) async fn forward_stream<R>(mut reader: R, id: String, kind: StreamKind, hub: EventHub)
where
    R: AsyncRead + Unpin,
{
    let mut chunker = Utf8Chunker::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let text = chunker.push(&buf[..n]);
                if !text.is_empty() {
                    hub.broadcast(&kind.event(&id, text));
                }
            }
            Err(e) => {
                debug!(id = %id, stream = ?kind, error = %e, "stream read error");
                break;
            }
        }
    }

    let rest = chunker.finish();
    if !rest.is_empty() {
        hub.broadcast(&kind.event(&id, rest));
    }
    debug!(id = %id, stream = ?kind, "stream closed");
}

/// Write queued input to the child's stdin until the queue or the pipe
/// closes.
pub(crate) async fn write_stdin_loop(
    mut stdin: ChildStdin,
    id: String,
    mut rx: UnboundedReceiver<Vec<u8>>,
) {
    while let Some(data) = rx.recv().await {
        if let Err(e) = stdin.write_all(&data).await {
            debug!(id = %id, error = %e, "stdin write failed; closing input");
            break;
        }
        if let Err(e) = stdin.flush().await {
            debug!(id = %id, error = %e, "stdin flush failed; closing input");
            break;
        }
    }
    debug!(id = %id, "stdin writer finished");
}
