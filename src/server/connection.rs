// src/server/connection.rs

//! Per-connection handling.
//!
//! Requests on one connection are served in arrival order. Everything that
//! goes back to the peer (responses and, once subscribed, events) is queued
//! on a single bounded frame channel drained by a dedicated write task. A
//! slow peer only ever delays itself; one that stops reading entirely loses
//! its event subscription.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixStream;
use tokio::sync::mpsc::{self, Receiver};
use tracing::{debug, error, info};

use crate::events::{SubscriberId, SUBSCRIBER_QUEUE_DEPTH};
use crate::protocol::{encode_frame, FrameDecoder, RawRequest, Response};
use crate::rpc::{Caller, Dispatcher};

const READ_BUFFER: usize = 64 * 1024;

pub async fn serve_connection(stream: UnixStream, dispatcher: Dispatcher) {
    let connection_id = dispatcher.daemon().next_connection_id();
    debug!(connection = connection_id, "client connected");

    let (mut reader, writer) = stream.into_split();
    let (frames_tx, frames_rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
    let write_task = tokio::spawn(write_loop(writer, frames_rx, connection_id));

    let caller = Caller {
        connection_id,
        frames: frames_tx,
    };

    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; READ_BUFFER];

    'read: loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(connection = connection_id, error = %e, "read failed");
                break;
            }
        };

        for raw in decoder.feed::<RawRequest>(&buf[..n]) {
            let response = dispatcher.handle_raw(&caller, raw);
            let frame = match encode_frame(&response) {
                Ok(frame) => frame,
                Err(e) => {
                    error!(connection = connection_id, error = %e, "failed to encode response");
                    // The caller still gets exactly one reply.
                    match encode_frame(&Response::err(e.to_string())) {
                        Ok(frame) => frame,
                        Err(_) => continue,
                    }
                }
            };
            if caller.frames.send(frame).await.is_err() {
                debug!(connection = connection_id, "write side closed");
                break 'read;
            }
        }
    }

    // Unsubscribe first: the hub holds the last other sender, and the write
    // task only finishes once every sender is gone.
    dispatcher.daemon().hub.unsubscribe(connection_id);
    drop(caller);
    if let Err(e) = write_task.await {
        error!(connection = connection_id, error = %e, "write task panicked");
    }

    info!(
        connection = connection_id,
        discarded_frames = decoder.discarded(),
        "client disconnected"
    );
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut frames: Receiver<Vec<u8>>,
    connection_id: SubscriberId,
) {
    while let Some(frame) = frames.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            debug!(connection = connection_id, error = %e, "write failed; closing");
            break;
        }
    }
    let _ = writer.shutdown().await;
}
