// src/protocol/framing.rs

//! Length-prefixed framing.
//!
//! ```text
//! [u32 BE length] [payload: length bytes of UTF-8 JSON]
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::errors::{DaemonError, Result};

/// Maximum frame payload size (16 MB). Anything larger is treated as garbage.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

const HEADER_LEN: usize = 4;

/// Serialize `message` as JSON and wrap it in a frame.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(message)?;
    encode_payload(&payload)
}

/// Wrap an already-serialized payload in a frame.
///
/// Payloads the decoder would refuse are refused here too.
pub fn encode_payload(payload: &[u8]) -> Result<Vec<u8>> {
    let length = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_SIZE)
        .ok_or(DaemonError::FrameTooLarge {
            size: payload.len(),
            limit: MAX_FRAME_SIZE,
        })?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(&length.to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Incremental frame decoder that handles partial reads.
///
/// Bytes go in through [`FrameDecoder::feed`]; every complete, well-formed
/// frame comes out. A trailing partial frame stays buffered for the next
/// call. A frame whose payload does not parse as `T` (or whose declared
/// length is absurd) causes the whole buffer to be dropped, so decoding
/// resynchronises on whatever frame the peer sends next.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    discarded: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the decoder and extract all complete messages.
    pub fn feed<T: DeserializeOwned>(&mut self, bytes: &[u8]) -> Vec<T> {
        self.buf.extend_from_slice(bytes);
        let mut messages = Vec::new();

        while self.buf.len() >= HEADER_LEN {
            let length = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]);

            if length > MAX_FRAME_SIZE {
                warn!(
                    length,
                    max = MAX_FRAME_SIZE,
                    "frame length exceeds limit; dropping buffered bytes"
                );
                self.discard();
                break;
            }

            let total = HEADER_LEN + length as usize;
            if self.buf.len() < total {
                break;
            }

            match serde_json::from_slice::<T>(&self.buf[HEADER_LEN..total]) {
                Ok(message) => {
                    messages.push(message);
                    self.buf.drain(..total);
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        buffered = self.buf.len(),
                        "malformed frame payload; dropping buffered bytes"
                    );
                    self.discard();
                    break;
                }
            }
        }

        messages
    }

    /// Returns true if the decoder has buffered partial data.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Number of times the buffer was thrown away because of bad input.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn discard(&mut self) {
        self.buf.clear();
        self.discarded += 1;
    }
}
