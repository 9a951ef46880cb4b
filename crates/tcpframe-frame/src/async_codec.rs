//! `tokio_util::codec` adapter for the same 4-byte big-endian wire format.

use bytes::{Bytes, BytesMut};
use tcpframe_transport::TransportError;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Length-prefixed frame codec for `FramedRead` / `FramedWrite`.
///
/// Oversized declarations fail as soon as the header is buffered. The limit
/// only guards decoding; encoding accepts anything the header can describe.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_payload_size: usize,
}

impl FrameCodec {
    pub fn new(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        decode_frame(src, self.max_payload_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }

        let expected = match src.get(..HEADER_SIZE) {
            Some(header) => {
                let mut raw = [0u8; HEADER_SIZE];
                raw.copy_from_slice(header);
                HEADER_SIZE + u32::from_be_bytes(raw) as usize
            }
            None => HEADER_SIZE,
        };
        Err(TransportError::PrematureClose {
            expected,
            received: src.len(),
        }
        .into())
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        encode_frame(&item, dst)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        Encoder::<Bytes>::encode(self, item.payload, dst)
    }
}
