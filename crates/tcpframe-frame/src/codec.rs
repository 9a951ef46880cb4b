use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: a single 4-byte big-endian payload length.
pub const HEADER_SIZE: usize = 4;

/// Default maximum payload size: 10,000,000 bytes.
pub const DEFAULT_MAX_PAYLOAD: usize = 10_000_000;

/// One length-prefixed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The message payload (opaque bytes).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────────────────┐
/// │ Length (4B BE)   │ Payload          │
/// │ u32, big-endian  │ (Length bytes)   │
/// └──────────────────┴──────────────────┘
/// ```
///
/// Header and payload land in `dst` contiguously so they can be sent as one
/// write.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::FrameTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32(len);
    dst.put_slice(payload);
    Ok(())
}

/// Parse a header and enforce `max_payload`.
///
/// This is the cheap rejection path: an oversized declaration fails here,
/// before any body byte is read or buffered.
pub fn decode_header(header: [u8; HEADER_SIZE], max_payload: usize) -> Result<usize> {
    let len = u32::from_be_bytes(header) as usize;
    if len > max_payload {
        return Err(FrameError::FrameTooLarge {
            size: len,
            max: max_payload,
        });
    }
    Ok(len)
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    let Some(header) = src.get(..HEADER_SIZE) else {
        return Ok(None); // Need more data
    };
    let mut raw = [0u8; HEADER_SIZE];
    raw.copy_from_slice(header);
    let payload_len = decode_header(raw, max_payload)?;

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { payload }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest payload accepted when reading, in bytes. Default: 10,000,000.
    /// Writers do not apply it.
    pub max_payload_size: usize,
    /// Deadline for each exact read (header, then body). `None` blocks forever.
    pub read_timeout: Option<Duration>,
    /// Deadline for writing one whole frame. `None` blocks forever.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl FrameConfig {
    /// Same deadline for reads and writes.
    pub fn with_io_timeout(max_payload_size: usize, io_timeout: Duration) -> Self {
        Self {
            max_payload_size,
            read_timeout: Some(io_timeout),
            write_timeout: Some(io_timeout),
        }
    }
}
