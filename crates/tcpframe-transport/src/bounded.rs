//! Deadline-bounded exact reads and complete writes.
//!
//! Every helper here loops over partial transfers and converts "no progress
//! before the deadline" into [`TransportError::Timeout`]. A limit applies to
//! the whole call, not to each underlying `read`/`write`.

use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::TimeoutStream;

/// A point in time after which a bounded operation must give up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
    limit: Option<Duration>,
}

impl Deadline {
    /// A deadline `limit` from now. `None` never expires, and neither does a
    /// limit too far out for the clock to represent.
    pub fn after(limit: Option<Duration>) -> Self {
        Self {
            at: limit.and_then(|limit| Instant::now().checked_add(limit)),
            limit,
        }
    }

    /// A deadline that never expires.
    pub fn never() -> Self {
        Self::after(None)
    }

    /// Time left before expiry.
    ///
    /// Returns `Ok(None)` for an unbounded deadline and `Err(())` once expired.
    #[allow(clippy::result_unit_err)]
    pub fn remaining(&self) -> std::result::Result<Option<Duration>, ()> {
        match self.at {
            None => Ok(None),
            Some(at) => match at.checked_duration_since(Instant::now()) {
                Some(left) if !left.is_zero() => Ok(Some(left)),
                _ => Err(()),
            },
        }
    }

    /// The original limit this deadline was created with.
    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    fn expired(&self, op: &'static str) -> TransportError {
        TransportError::Timeout {
            op,
            limit: self.limit.unwrap_or_default(),
        }
    }
}

/// Read exactly `n` bytes within `limit`.
pub fn read_exact<S>(stream: &mut S, n: usize, limit: Option<Duration>) -> Result<Vec<u8>>
where
    S: Read + TimeoutStream + ?Sized,
{
    let mut buf = vec![0u8; n];
    read_exact_into(stream, &mut buf, limit)?;
    Ok(buf)
}

/// Fill `buf` completely within `limit`.
///
/// Fails with [`TransportError::PrematureClose`] if the stream reports EOF
/// first and with [`TransportError::Timeout`] once the deadline passes.
pub fn read_exact_into<S>(stream: &mut S, buf: &mut [u8], limit: Option<Duration>) -> Result<()>
where
    S: Read + TimeoutStream + ?Sized,
{
    let deadline = Deadline::after(limit);
    let mut filled = 0usize;

    while filled < buf.len() {
        let remaining = deadline.remaining().map_err(|()| deadline.expired("read"))?;
        stream.set_read_timeout(remaining)?;

        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(TransportError::PrematureClose {
                    expected: buf.len(),
                    received: filled,
                })
            }
            Ok(n) => {
                filled += n;
                trace!(read = n, filled, expected = buf.len(), "partial read");
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_timeout(&err) => return Err(deadline.expired("read")),
            Err(err) => return Err(TransportError::Io(err)),
        }
    }

    Ok(())
}

/// Write all of `data` within `limit`, then flush.
///
/// There is no partial success: either every byte was handed to the stream
/// or an error is returned.
pub fn write_all<S>(stream: &mut S, data: &[u8], limit: Option<Duration>) -> Result<()>
where
    S: Write + TimeoutStream + ?Sized,
{
    let deadline = Deadline::after(limit);
    let mut written = 0usize;

    while written < data.len() {
        let remaining = deadline.remaining().map_err(|()| deadline.expired("write"))?;
        stream.set_write_timeout(remaining)?;

        match stream.write(&data[written..]) {
            Ok(0) => {
                return Err(TransportError::PrematureClose {
                    expected: data.len(),
                    received: written,
                })
            }
            Ok(n) => written += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_timeout(&err) => return Err(deadline.expired("write")),
            Err(err) => return Err(TransportError::Io(err)),
        }
    }

    loop {
        match stream.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_timeout(&err) => return Err(deadline.expired("write")),
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
}

/// Socket timeouts surface as `WouldBlock` on Unix and `TimedOut` on Windows.
fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
