#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use execd::protocol::framing::encode_payload;
use execd::protocol::{encode_frame, Event, FrameDecoder, RawRequest, Response};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Minimal client speaking the daemon's wire protocol.
///
/// Responses and events share the connection; events that arrive while a
/// call is waiting for its response are stashed and returned by
/// [`TestClient::next_event`] later, in arrival order.
pub struct TestClient {
    stream: UnixStream,
    decoder: FrameDecoder,
    responses: VecDeque<Response>,
    events: VecDeque<Event>,
}

impl TestClient {
    pub async fn connect(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .await
            .with_context(|| format!("connecting to {}", path.display()))?;
        Ok(Self {
            stream,
            decoder: FrameDecoder::new(),
            responses: VecDeque::new(),
            events: VecDeque::new(),
        })
    }

    /// Send a request and wait for its response.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Response> {
        self.send(method, params).await?;
        self.next_response().await
    }

    /// Call and require `success: true`; returns the result.
    pub async fn call_ok(&mut self, method: &str, params: Value) -> Result<Value> {
        let response = self.call(method, params).await?;
        if !response.success {
            bail!("{method} failed: {:?}", response.error);
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    pub async fn send(&mut self, method: &str, params: Value) -> Result<()> {
        let frame = encode_frame(&RawRequest::new(method, params))?;
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Write an arbitrary payload inside a well-formed length prefix.
    pub async fn send_payload(&mut self, payload: &[u8]) -> Result<()> {
        self.stream.write_all(&encode_payload(payload)?).await?;
        Ok(())
    }

    /// Write raw bytes, framing included.
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    pub async fn next_response(&mut self) -> Result<Response> {
        loop {
            if let Some(response) = self.responses.pop_front() {
                return Ok(response);
            }
            self.read_frames().await?;
        }
    }

    pub async fn next_event(&mut self) -> Result<Event> {
        loop {
            if let Some(event) = self.events.pop_front() {
                return Ok(event);
            }
            self.read_frames().await?;
        }
    }

    /// Collect the events of session `id` up to and including its `exit`
    /// (or `error`). Events of other sessions are kept for later.
    pub async fn events_until_exit(&mut self, id: &str) -> Result<Vec<Event>> {
        let mut collected = Vec::new();
        let mut others = VecDeque::new();

        loop {
            let event = self.next_event().await?;
            if event.session_id() != Some(id) {
                others.push_back(event);
                continue;
            }
            let done = matches!(event, Event::Exit { .. } | Event::Error { .. });
            collected.push(event);
            if done {
                break;
            }
        }

        others.extend(self.events.drain(..));
        self.events = others;
        Ok(collected)
    }

    async fn read_frames(&mut self) -> Result<()> {
        let mut buf = vec![0u8; 16 * 1024];
        let n = self.stream.read(&mut buf).await?;
        if n == 0 {
            return Err(anyhow!("connection closed by daemon"));
        }

        for value in self.decoder.feed::<Value>(&buf[..n]) {
            if value.get("type").is_some() {
                self.events.push_back(serde_json::from_value(value)?);
            } else {
                self.responses.push_back(serde_json::from_value(value)?);
            }
        }
        Ok(())
    }
}
