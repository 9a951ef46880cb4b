use std::fmt;

use tcpframe_frame::FrameError;
use tcpframe_transport::TransportError;

/// Failure taxonomy for one connection's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Local address unavailable or already in use.
    BindError,
    /// No peer connected within the accept deadline.
    AcceptTimeout,
    /// The requester could not establish the connection.
    ConnectError,
    /// A read or write exceeded its deadline.
    Timeout,
    /// The peer closed the stream before a complete frame arrived.
    PrematureClose,
    /// A declared length exceeded the configured maximum.
    FrameTooLarge,
    /// Any other lower-level I/O failure.
    TransportError,
    /// The payload is not valid UTF-8.
    PayloadDecodeError,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BindError => "bind_error",
            Self::AcceptTimeout => "accept_timeout",
            Self::ConnectError => "connect_error",
            Self::Timeout => "timeout",
            Self::PrematureClose => "premature_close",
            Self::FrameTooLarge => "frame_too_large",
            Self::TransportError => "transport_error",
            Self::PayloadDecodeError => "payload_decode_error",
        }
    }

    /// Classify a transport failure.
    pub fn of_transport(err: &TransportError) -> Self {
        match err {
            TransportError::Bind { .. } => Self::BindError,
            TransportError::Connect { .. } => Self::ConnectError,
            TransportError::AcceptTimeout(_) => Self::AcceptTimeout,
            TransportError::Timeout { .. } => Self::Timeout,
            TransportError::PrematureClose { .. } => Self::PrematureClose,
            TransportError::Accept(_)
            | TransportError::Io(_)
            | TransportError::InvalidAddress { .. } => Self::TransportError,
        }
    }

    /// Classify a framing failure.
    pub fn of_frame(err: &FrameError) -> Self {
        match err {
            FrameError::FrameTooLarge { .. } => Self::FrameTooLarge,
            FrameError::Transport(err) => Self::of_transport(err),
            FrameError::Io(_) => Self::TransportError,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step of the exchange at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Bind,
    Accept,
    Connect,
    ReadRequest,
    SendRequest,
    ReadResponse,
    SendResponse,
    DecodePayload,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bind => "bind",
            Self::Accept => "accept",
            Self::Connect => "connect",
            Self::ReadRequest => "read request",
            Self::SendRequest => "send request",
            Self::ReadResponse => "read response",
            Self::SendResponse => "send response",
            Self::DecodePayload => "decode payload",
        };
        f.write_str(name)
    }
}

/// A classified session failure with a human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{phase} failed ({kind}): {detail}")]
pub struct SessionError {
    pub kind: FailureKind,
    pub phase: Phase,
    pub detail: String,
}

impl SessionError {
    pub fn new(kind: FailureKind, phase: Phase, detail: impl Into<String>) -> Self {
        Self {
            kind,
            phase,
            detail: detail.into(),
        }
    }

    pub fn from_transport(phase: Phase, err: TransportError) -> Self {
        Self::new(FailureKind::of_transport(&err), phase, err.to_string())
    }

    pub fn from_frame(phase: Phase, err: FrameError) -> Self {
        Self::new(FailureKind::of_frame(&err), phase, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
