//! Newline-delimited JSON frame codec.
//!
//! Wire format:
//! ```text
//! ┌──────────────────────────────┬──────┐
//! │ JSON object (≤ 1023 B, UTF-8)│ '\n' │
//! └──────────────────────────────┴──────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete lines.  A
//! single read may return part of a line or several lines at once.  A
//! line that outgrows the buffer is discarded up to its newline.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::app::commands::{CommandRequest, ResultBody};
use crate::app::telemetry::Snapshot;
use crate::error::TransportError;

use super::channels::{CommandMsg, Outbound};

/// Maximum frame size including the terminating newline.
pub const MAX_FRAME_SIZE: usize = 1024;

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Appending bytes to the current line.
    Collecting,
    /// Current line overflowed; dropping bytes until the next newline.
    Discarding,
}

/// Streaming line decoder.
pub struct FrameDecoder {
    state: DecoderState,
    buf: Vec<u8, MAX_FRAME_SIZE>,
    dropped: u32,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Collecting,
            buf: Vec::new(),
            dropped: 0,
        }
    }

    /// Feed bytes into the decoder, calling `on_frame` for every complete,
    /// non-empty line (without its `\n` / `\r\n` terminator).
    ///
    /// Returns the number of frames yielded.
    pub fn feed(&mut self, data: &[u8], mut on_frame: impl FnMut(&[u8])) -> usize {
        let mut frames = 0;

        for &byte in data {
            match (self.state, byte) {
                (DecoderState::Discarding, b'\n') => {
                    self.state = DecoderState::Collecting;
                }
                (DecoderState::Discarding, _) => {}
                (DecoderState::Collecting, b'\n') => {
                    let line = self.buf.strip_suffix(b"\r").unwrap_or(&self.buf[..]);
                    if !line.is_empty() {
                        on_frame(line);
                        frames += 1;
                    }
                    self.buf.clear();
                }
                (DecoderState::Collecting, _) => {
                    // Leave room for the newline so a full frame is MAX_FRAME_SIZE on the wire.
                    if self.buf.len() + 1 >= MAX_FRAME_SIZE || self.buf.push(byte).is_err() {
                        self.buf.clear();
                        self.dropped = self.dropped.wrapping_add(1);
                        self.state = DecoderState::Discarding;
                    }
                }
            }
        }

        frames
    }

    /// Reset decoder state (e.g. after the stream is reopened).
    pub fn reset(&mut self) {
        self.state = DecoderState::Collecting;
        self.buf.clear();
    }

    /// Number of oversized frames discarded so far.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Frame payloads
// ---------------------------------------------------------------------------

/// Inbound direct-method frame.
///
/// `payload` is any JSON value; its JSON text becomes the raw method
/// payload, so `"payload": "on"` arrives as the bytes `"on"` (quoted).
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub id: u32,
    pub method: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl InboundFrame {
    pub fn into_command(self) -> CommandMsg {
        // Serialising a `Value` cannot fail.
        let payload = serde_json::to_vec(&self.payload).unwrap_or_default();
        CommandMsg {
            id: self.id,
            request: CommandRequest {
                name: self.method,
                payload,
            },
        }
    }
}

/// Decode one line into a command message.
pub fn decode_frame(line: &[u8]) -> Result<CommandMsg, serde_json::Error> {
    serde_json::from_slice::<InboundFrame>(line).map(InboundFrame::into_command)
}

/// Outbound frame as it appears on the wire.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame<'a> {
    Response {
        id: u32,
        status: u16,
        payload: &'a ResultBody,
    },
    Reported {
        device: &'a str,
        properties: &'a Snapshot,
    },
}

impl<'a> OutboundFrame<'a> {
    pub fn from_outbound(frame: &'a Outbound, device: &'a str) -> Self {
        match frame {
            Outbound::Response { id, result } => Self::Response {
                id: *id,
                status: result.status,
                payload: &result.body,
            },
            Outbound::Report(snapshot) => Self::Reported {
                device,
                properties: snapshot,
            },
        }
    }
}

/// Encode an outbound frame as one newline-terminated line.
pub fn encode_frame(frame: &OutboundFrame<'_>) -> Result<std::vec::Vec<u8>, TransportError> {
    let mut out = serde_json::to_vec(frame).map_err(|_| TransportError::Encode)?;
    if out.len() + 1 > MAX_FRAME_SIZE {
        return Err(TransportError::Encode);
    }
    out.push(b'\n');
    Ok(out)
}
