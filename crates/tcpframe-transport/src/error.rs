use std::net::SocketAddr;
use std::time::Duration;

/// Errors that can occur in TCP transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind or listen on the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// No peer connected before the accept deadline expired.
    #[error("no connection accepted within {0:?}")]
    AcceptTimeout(Duration),

    /// A bounded read or write made no progress before its deadline.
    #[error("{op} timed out after {limit:?}")]
    Timeout { op: &'static str, limit: Duration },

    /// The peer closed the stream before the expected bytes arrived.
    #[error("connection closed after {received} of {expected} bytes")]
    PrematureClose { expected: usize, received: usize },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The address string could not be resolved to a socket address.
    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },
}

impl TransportError {
    /// True when the error came from a deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::AcceptTimeout(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
