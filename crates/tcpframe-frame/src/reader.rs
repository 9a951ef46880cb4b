use std::io::Read;

use bytes::Bytes;
use tcpframe_transport::{read_exact, read_exact_into, TimeoutStream};
use tracing::debug;

use crate::codec::{decode_header, Frame, FrameConfig, HEADER_SIZE};
use crate::error::Result;

/// Read one complete frame from `stream`.
///
/// The header is read with its own deadline, validated against
/// `config.max_payload_size`, and only then is the body read with a fresh
/// deadline. An oversized declaration returns `FrameTooLarge` without touching
/// the body, leaving the stream unusable for further frames.
pub fn read_frame_from<T>(stream: &mut T, config: &FrameConfig) -> Result<Frame>
where
    T: Read + TimeoutStream + ?Sized,
{
    let mut header = [0u8; HEADER_SIZE];
    read_exact_into(stream, &mut header, config.read_timeout)?;
    let len = decode_header(header, config.max_payload_size)?;

    let payload = read_exact(stream, len, config.read_timeout)?;
    debug!(size = len, "frame received");
    Ok(Frame::new(payload))
}

/// Reads complete frames from a deadline-capable stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read + TimeoutStream> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame (blocking, bounded by `read_timeout`).
    pub fn read_frame(&mut self) -> Result<Frame> {
        read_frame_from(&mut self.inner, &self.config)
    }

    /// Read the next frame and return only its payload.
    pub fn read_payload(&mut self) -> Result<Bytes> {
        self.read_frame().map(Frame::into_payload)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, ErrorKind, Write};
    use std::net::{TcpListener, TcpStream};
    use std::time::{Duration, Instant};

    use bytes::{BufMut, BytesMut};
    use tcpframe_transport::TransportError;

    use super::*;
    use crate::codec::{encode_frame, DEFAULT_MAX_PAYLOAD};
    use crate::error::FrameError;

    /// In-memory stream that hands out at most `chunk` bytes per read, then
    /// either EOF or a timeout once the script runs dry.
    struct MemStream {
        bytes: Vec<u8>,
        pos: usize,
        chunk: usize,
        stall_at_end: bool,
        reads: usize,
    }

    impl MemStream {
        fn new(bytes: Vec<u8>) -> Self {
            Self {
                bytes,
                pos: 0,
                chunk: usize::MAX,
                stall_at_end: false,
                reads: 0,
            }
        }

        fn byte_by_byte(bytes: Vec<u8>) -> Self {
            Self {
                chunk: 1,
                ..Self::new(bytes)
            }
        }

        fn stalling(bytes: Vec<u8>) -> Self {
            Self {
                stall_at_end: true,
                ..Self::new(bytes)
            }
        }
    }

    impl Read for MemStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.pos >= self.bytes.len() {
                if self.stall_at_end {
                    return Err(io::Error::from(ErrorKind::WouldBlock));
                }
                return Ok(0);
            }
            let n = (self.bytes.len() - self.pos).min(buf.len()).min(self.chunk);
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    impl TimeoutStream for MemStream {
        fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
            Ok(())
        }

        fn set_write_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
            Ok(())
        }
    }

    fn wire(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(payload, &mut buf).unwrap();
        buf.to_vec()
    }

    fn config(max: usize) -> FrameConfig {
        FrameConfig::with_io_timeout(max, Duration::from_secs(2))
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(MemStream::new(wire(b"hello")));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn read_empty_frame() {
        let mut reader = FrameReader::new(MemStream::new(wire(b"")));
        assert!(reader.read_payload().unwrap().is_empty());
    }

    #[test]
    fn read_frame_with_large_payload() {
        let payload = vec![0xAB; 64 * 1024];
        let mut reader = FrameReader::new(MemStream::new(wire(&payload)));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn partial_read_matches_whole_read() {
        let payload = br#"{"cmd":"ping"}"#;
        let whole = FrameReader::new(MemStream::new(wire(payload)))
            .read_frame()
            .unwrap();

        let mut slow = FrameReader::new(MemStream::byte_by_byte(wire(payload)));
        let trickled = slow.read_frame().unwrap();

        assert_eq!(whole, trickled);
        assert_eq!(slow.get_ref().reads, HEADER_SIZE + payload.len());
    }

    #[test]
    fn payload_at_max_is_accepted() {
        let payload = vec![1u8; 32];
        let mut reader = FrameReader::with_config(MemStream::new(wire(&payload)), config(32));
        assert_eq!(reader.read_payload().unwrap().len(), 32);
    }

    #[test]
    fn payload_over_max_rejected_without_reading_body() {
        let payload = vec![1u8; 33];
        let mut reader =
            FrameReader::with_config(MemStream::byte_by_byte(wire(&payload)), config(32));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 33, max: 32 }));
        assert_eq!(reader.get_ref().pos, HEADER_SIZE);
    }

    #[test]
    fn connection_closed_before_header() {
        let mut reader = FrameReader::new(MemStream::new(Vec::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(err.is_premature_close());
    }

    #[test]
    fn connection_closed_after_header_only() {
        let mut partial = BytesMut::new();
        partial.put_u32(16);

        let mut reader = FrameReader::new(MemStream::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::PrematureClose {
                expected: 16,
                received: 0
            })
        ));
    }

    #[test]
    fn connection_closed_mid_body() {
        let mut partial = BytesMut::new();
        partial.put_u32(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(MemStream::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(err.is_premature_close());
    }

    #[test]
    fn stalled_stream_times_out() {
        let mut partial = BytesMut::new();
        partial.put_u32(8);
        partial.put_slice(b"abc");

        let mut reader = FrameReader::with_config(
            MemStream::stalling(partial.to_vec()),
            config(DEFAULT_MAX_PAYLOAD),
        );
        let err = reader.read_frame().unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = FrameReader::new(MemStream::new(Vec::new()));

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        assert_eq!(reader.config().max_payload_size, DEFAULT_MAX_PAYLOAD);
        let _inner = reader.into_inner();
    }

    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = std::thread::spawn(move || TcpStream::connect(addr).unwrap());
        let (server, _) = listener.accept().unwrap();
        (server, client.join().unwrap())
    }

    #[test]
    fn roundtrip_over_tcp() {
        let (left, right) = tcp_pair();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::with_config(right, config(DEFAULT_MAX_PAYLOAD));

        writer.send(b"ping").unwrap();
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), b"ping");
    }

    #[test]
    fn tcp_partial_frame_times_out() {
        let (mut left, right) = tcp_pair();
        let mut partial = BytesMut::new();
        partial.put_u32(10);
        partial.put_slice(b"abc");
        left.write_all(&partial).unwrap();

        let cfg = FrameConfig::with_io_timeout(DEFAULT_MAX_PAYLOAD, Duration::from_millis(100));
        let mut reader = FrameReader::with_config(right, cfg);

        let started = Instant::now();
        let err = reader.read_frame().unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() >= Duration::from_millis(100));

        // A timed-out stream is dropped, never reused.
        drop(reader);
        drop(left);
    }
}
