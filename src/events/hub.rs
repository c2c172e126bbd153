// src/events/hub.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tracing::{debug, error, warn};

use crate::protocol::{encode_frame, Event};

/// Identifier of a subscribed connection.
pub type SubscriberId = u64;

/// Frames a connection may have queued before it counts as stalled.
pub const SUBSCRIBER_QUEUE_DEPTH: usize = 1024;

/// Process-wide subscriber set.
///
/// Each subscriber is represented by the frame queue of its connection's
/// write task. Registration, removal and delivery all happen under the same
/// lock, so a broadcast never races with a (de)registration.
///
/// Delivery only enqueues encoded frames and never waits. A subscriber whose
/// queue is full (a peer that stopped reading) or closed (its write task has
/// died) is removed, and only that one.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    subscribers: Arc<Mutex<HashMap<SubscriberId, Sender<Vec<u8>>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns `false` if it was already subscribed
    /// (the sender is refreshed either way).
    pub fn subscribe(&self, id: SubscriberId, frames: Sender<Vec<u8>>) -> bool {
        let added = self.lock().insert(id, frames).is_none();
        debug!(subscriber = id, added, "event subscriber registered");
        added
    }

    /// Remove a connection. Called when the connection closes, cleanly or not.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            debug!(subscriber = id, "event subscriber removed");
        }
        removed
    }

    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Frame `event` once and queue it for every subscriber.
    ///
    /// Returns the number of subscribers the frame was queued for.
    pub fn broadcast(&self, event: &Event) -> usize {
        let frame = match encode_frame(event) {
            Ok(frame) => frame,
            Err(e) => {
                error!(kind = event.kind(), error = %e, "failed to encode event");
                return 0;
            }
        };

        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|id, tx| match tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(subscriber = *id, "dropping subscriber that stopped reading");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(subscriber = *id, "dropping subscriber with closed connection");
                false
            }
        });
        let delivered = subscribers.len();

        debug!(
            kind = event.kind(),
            id = event.session_id().unwrap_or("-"),
            delivered,
            dropped = before - delivered,
            "event broadcast"
        );

        delivered
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriberId, Sender<Vec<u8>>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
