use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tcpframe_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};
use tcpframe_transport::TcpTransport;

use crate::request::CommandRequest;

/// Default bind / remote address.
pub const DEFAULT_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
    5000,
);
/// Default wait for one inbound connection.
pub const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(15);
/// Default per-read / per-write deadline.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);
/// Default canned response.
pub const DEFAULT_RESPONSE: &str = "Hello, client!";
/// Bytes of a non-JSON payload shown in diagnostics.
pub const DEFAULT_PREVIEW_LIMIT: usize = 200;

/// What the responder does when the request frame cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestPolicy {
    /// Log the failure and still send the response.
    #[default]
    Lenient,
    /// End the session with the request failure, without responding.
    Strict,
}

/// Logging context attached to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLog {
    /// Label recorded on the role's span.
    pub session: String,
    /// Maximum payload bytes rendered in a raw preview.
    pub preview_limit: usize,
}

impl SessionLog {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self {
            session: "default".to_string(),
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

/// Configuration for a single-shot [`Responder`](crate::Responder).
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    pub bind_addr: SocketAddr,
    pub accept_timeout: Duration,
    pub io_timeout: Duration,
    pub max_frame_size: usize,
    pub response: Bytes,
    pub request_policy: RequestPolicy,
    /// When false the response is pushed right after accept and no request is read.
    pub expect_request: bool,
    pub backlog: i32,
    pub log: SessionLog,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
            max_frame_size: DEFAULT_MAX_PAYLOAD,
            response: Bytes::from_static(DEFAULT_RESPONSE.as_bytes()),
            request_policy: RequestPolicy::default(),
            expect_request: true,
            backlog: TcpTransport::DEFAULT_BACKLOG,
            log: SessionLog::default(),
        }
    }
}

impl ResponderConfig {
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig::with_io_timeout(self.max_frame_size, self.io_timeout)
    }
}

/// Configuration for a single-shot [`Requester`](crate::Requester).
#[derive(Debug, Clone)]
pub struct RequesterConfig {
    pub remote_addr: SocketAddr,
    /// `None` leaves connection establishment to the OS default.
    pub connect_timeout: Option<Duration>,
    pub io_timeout: Duration,
    pub max_frame_size: usize,
    /// `None` reads a pushed response without sending anything.
    pub request: Option<Bytes>,
    pub log: SessionLog,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            remote_addr: DEFAULT_ADDR,
            connect_timeout: Some(DEFAULT_IO_TIMEOUT),
            io_timeout: DEFAULT_IO_TIMEOUT,
            max_frame_size: DEFAULT_MAX_PAYLOAD,
            request: Some(default_request()),
            log: SessionLog::default(),
        }
    }
}

impl RequesterConfig {
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig::with_io_timeout(self.max_frame_size, self.io_timeout)
    }
}

fn default_request() -> Bytes {
    // `{"cmd":"ping"}` always serializes.
    CommandRequest::ping()
        .to_bytes()
        .unwrap_or_else(|_| Bytes::from_static(br#"{"cmd":"ping"}"#))
}
