// src/events/mod.rs

//! Fan-out of asynchronous events to subscribed connections.

pub mod hub;

pub use hub::{EventHub, SubscriberId, SUBSCRIBER_QUEUE_DEPTH};
