// src/protocol/mod.rs

//! Wire protocol spoken over the daemon socket.
//!
//! One frame format carries everything: requests, their responses and pushed
//! events. A frame is a 4-byte big-endian length followed by that many bytes
//! of UTF-8 JSON.
//!
//! - [`framing`] encodes frames and reassembles them from a byte stream.
//! - [`request`] turns a decoded payload into a typed [`Request`].
//! - [`response`] is the `{success, result | error}` envelope.
//! - [`event`] holds the asynchronous event shapes (`type` tagged).

pub mod event;
pub mod framing;
pub mod request;
pub mod response;

pub use event::Event;
pub use framing::{encode_frame, FrameDecoder, MAX_FRAME_SIZE};
pub use request::{RawRequest, Request, RequestError};
pub use response::Response;
