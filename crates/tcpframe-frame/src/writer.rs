use std::io::Write;

use bytes::BytesMut;
use tcpframe_transport::{write_all, TimeoutStream};
use tracing::debug;

use crate::codec::{encode_frame, Frame, FrameConfig, HEADER_SIZE};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Encode `payload` and write it to `stream` as one bounded write.
///
/// `max_payload_size` is a receive limit and is not applied here; only
/// payloads that cannot fit the 32-bit header are refused.
pub fn write_frame_to<T>(stream: &mut T, payload: &[u8], config: &FrameConfig) -> Result<()>
where
    T: Write + TimeoutStream + ?Sized,
{
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    send_encoded(stream, payload, config, &mut buf)
}

fn send_encoded<T>(
    stream: &mut T,
    payload: &[u8],
    config: &FrameConfig,
    buf: &mut BytesMut,
) -> Result<()>
where
    T: Write + TimeoutStream + ?Sized,
{
    buf.clear();
    encode_frame(payload, buf)?;
    write_all(stream, &buf[..], config.write_timeout)?;
    debug!(size = payload.len(), "frame sent");
    Ok(())
}

/// Writes complete frames to a deadline-capable stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write + TimeoutStream> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.payload.as_ref())
    }

    /// Encode and send a payload.
    ///
    /// Header and body go out in a single bounded write. Nothing is written
    /// if the payload length does not fit the 32-bit header.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        send_encoded(&mut self.inner, payload, &self.config, &mut self.buf)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
