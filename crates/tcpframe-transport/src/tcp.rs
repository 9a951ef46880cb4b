use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info};

use crate::bounded::Deadline;
use crate::connection::Connection;
use crate::error::{Result, TransportError};

/// Shortest receive timeout armed on the listener. A zero `SO_RCVTIMEO`
/// means "block forever", so sub-microsecond remainders are rounded up.
#[cfg(any(target_os = "linux", target_os = "android"))]
const MIN_ACCEPT_WAIT: Duration = Duration::from_millis(1);

/// How often a pending accept re-checks a non-blocking listener.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP transport.
///
/// Provides bind/accept/connect over IPv4 or IPv6. On Linux the listener
/// blocks in `accept` with `SO_RCVTIMEO` armed from the remaining deadline.
/// Elsewhere accept ignores that option, so the listener is non-blocking and
/// polled. Accepted streams are always blocking with per-call timeouts.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
    backlog: i32,
}

impl TcpTransport {
    /// Default listen backlog: one pending connection.
    pub const DEFAULT_BACKLOG: i32 = 1;

    /// Bind and listen on `addr` with the default backlog.
    ///
    /// Address reuse is enabled so that a restarted process can bind while a
    /// previous socket on the same address lingers in `TIME_WAIT`.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        Self::bind_with_backlog(addr, Self::DEFAULT_BACKLOG)
    }

    /// Bind and listen on `addr` with an explicit backlog.
    pub fn bind_with_backlog(addr: SocketAddr, backlog: i32) -> Result<Self> {
        let bind_err = |source| TransportError::Bind { addr, source };

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(bind_err)?;
        // On Windows SO_REUSEADDR allows stealing an active port.
        #[cfg(not(windows))]
        socket.set_reuse_address(true).map_err(bind_err)?;
        socket.bind(&addr.into()).map_err(bind_err)?;
        socket.listen(backlog.max(1)).map_err(bind_err)?;
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        socket.set_nonblocking(true).map_err(bind_err)?;

        let listener: TcpListener = socket.into();
        let local_addr = listener.local_addr().map_err(bind_err)?;

        info!(addr = %local_addr, backlog, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
            backlog,
        })
    }

    /// Wait up to `timeout` for one inbound connection.
    ///
    /// Returns [`TransportError::AcceptTimeout`] if nobody connects in time.
    /// A timeout too large for the clock waits without a deadline.
    pub fn accept(&self, timeout: Duration) -> Result<Connection> {
        let deadline = Deadline::after(Some(timeout));
        loop {
            let Ok(remaining) = deadline.remaining() else {
                return Err(TransportError::AcceptTimeout(timeout));
            };
            self.arm_accept(remaining).map_err(TransportError::Accept)?;

            match self.listener.accept() {
                Ok((stream, peer)) => {
                    // BSD-derived stacks inherit O_NONBLOCK from the listener.
                    stream.set_nonblocking(false).map_err(TransportError::Accept)?;
                    // Linux copies the listener's SO_RCVTIMEO into the new socket.
                    stream.set_read_timeout(None).map_err(TransportError::Accept)?;
                    debug!(%peer, "accepted connection");
                    return Ok(Connection::from_tcp(stream, peer));
                }
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    self.wait_pending(remaining);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Accept(err)),
            }
        }
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn arm_accept(&self, remaining: Option<Duration>) -> io::Result<()> {
        socket2::SockRef::from(&self.listener)
            .set_read_timeout(remaining.map(|left| left.max(MIN_ACCEPT_WAIT)))
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn arm_accept(&self, _remaining: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    // The blocking accept already waited out its SO_RCVTIMEO.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn wait_pending(&self, _remaining: Option<Duration>) {}

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn wait_pending(&self, remaining: Option<Duration>) {
        let pause = remaining.map_or(ACCEPT_POLL_INTERVAL, |left| left.min(ACCEPT_POLL_INTERVAL));
        std::thread::sleep(pause);
    }

    /// Connect to a listening peer, bounding connection setup by `timeout`.
    pub fn connect(addr: SocketAddr, timeout: Option<Duration>) -> Result<Connection> {
        let stream = match timeout {
            Some(timeout) if !timeout.is_zero() => TcpStream::connect_timeout(&addr, timeout),
            _ => TcpStream::connect(addr),
        }
        .map_err(|source| TransportError::Connect { addr, source })?;

        debug!(%addr, "connected to tcp socket");
        Ok(Connection::from_tcp(stream, addr))
    }

    /// The address this transport is bound to (with the real port if `0` was requested).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn backlog(&self) -> i32 {
        self.backlog
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        debug!(addr = %self.local_addr, "listener closed");
    }
}

/// Resolve `host:port` text to the first matching socket address.
pub fn resolve(input: &str) -> Result<SocketAddr> {
    let mut addrs = input
        .to_socket_addrs()
        .map_err(|err| TransportError::InvalidAddress {
            input: input.to_string(),
            reason: err.to_string(),
        })?;
    addrs.next().ok_or_else(|| TransportError::InvalidAddress {
        input: input.to_string(),
        reason: "no addresses resolved".to_string(),
    })
}
