#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{anyhow, Result};
use execd::events::{EventHub, SubscriberId, SUBSCRIBER_QUEUE_DEPTH};
use execd::protocol::{Event, FrameDecoder};
use tokio::sync::mpsc::{self, Receiver};

/// In-process event subscriber: registers a frame queue with an
/// [`EventHub`] and decodes what arrives on it.
pub struct EventRecorder {
    rx: Receiver<Vec<u8>>,
    decoder: FrameDecoder,
    queue: VecDeque<Event>,
}

impl EventRecorder {
    pub fn subscribe(hub: &EventHub, id: SubscriberId) -> Self {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
        hub.subscribe(id, tx);
        Self {
            rx,
            decoder: FrameDecoder::new(),
            queue: VecDeque::new(),
        }
    }

    pub async fn next(&mut self) -> Result<Event> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Ok(event);
            }
            let frame = self
                .rx
                .recv()
                .await
                .ok_or_else(|| anyhow!("event hub dropped the subscriber"))?;
            self.queue.extend(self.decoder.feed::<Event>(&frame));
        }
    }

    /// Next event, or `None` if nothing arrives within `wait`.
    pub async fn next_within(&mut self, wait: Duration) -> Option<Event> {
        tokio::time::timeout(wait, self.next()).await.ok()?.ok()
    }

    /// Events of session `id` up to and including its `exit` or `error`.
    /// Events of other sessions stay queued.
    pub async fn until_exit(&mut self, id: &str) -> Result<Vec<Event>> {
        let mut collected = Vec::new();
        let mut others = VecDeque::new();

        loop {
            let event = self.next().await?;
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

        others.extend(self.queue.drain(..));
        self.queue = others;
        Ok(collected)
    }
}

/// Concatenated `stdout` data in `events`.
pub fn stdout_of(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Stdout { data, .. } => Some(data.as_str()),
            _ => None,
        })
        .collect()
}

/// Concatenated `stderr` data in `events`.
pub fn stderr_of(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Stderr { data, .. } => Some(data.as_str()),
            _ => None,
        })
        .collect()
}
