use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

use crate::traits::TimeoutStream;

/// Half-close state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfCloseState {
    /// Both directions usable.
    Open,
    /// Write side shut down; reads still possible.
    WriteClosed,
    /// Both directions shut down.
    Closed,
}

/// One connected TCP stream, owned by exactly one role.
///
/// Dropping a `Connection` closes the socket, so every exit path of the
/// owning role releases it.
pub struct Connection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    state: HalfCloseState,
}

impl Connection {
    pub(crate) fn from_tcp(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            stream,
            peer_addr,
            read_timeout: None,
            write_timeout: None,
            state: HalfCloseState::Open,
        }
    }

    /// Address of the remote end.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Local address of this end, if the OS can still report it.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.stream.local_addr().ok()
    }

    /// Most recently armed read timeout.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Most recently armed write timeout.
    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout
    }

    pub fn state(&self) -> HalfCloseState {
        self.state
    }

    /// Signal "no more data from me" while keeping the read side open.
    ///
    /// Best-effort: returns `false` if the platform or peer refused, which is
    /// never an error for the caller.
    pub fn shutdown_write(&mut self) -> bool {
        if self.state != HalfCloseState::Open {
            return false;
        }
        match self.stream.shutdown(Shutdown::Write) {
            Ok(()) => {
                self.state = HalfCloseState::WriteClosed;
                debug!(peer = %self.peer_addr, "write side shut down");
                true
            }
            Err(err) => {
                debug!(peer = %self.peer_addr, error = %err, "half-close failed; ignoring");
                false
            }
        }
    }

    /// Shut down both directions and release the socket.
    pub fn close(mut self) {
        if self.state != HalfCloseState::Closed {
            let _ = self.stream.shutdown(Shutdown::Both);
            self.state = HalfCloseState::Closed;
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl TimeoutStream for Connection {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)?;
        self.read_timeout = timeout;
        Ok(())
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_write_timeout(timeout)?;
        self.write_timeout = timeout;
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!(peer = %self.peer_addr, state = ?self.state, "connection closed");
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer_addr", &self.peer_addr)
            .field("state", &self.state)
            .finish()
    }
}
