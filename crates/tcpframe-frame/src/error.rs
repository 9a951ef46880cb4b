use tcpframe_transport::TransportError;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The declared (or outgoing) payload length exceeds the configured maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The bounded read or write underneath the codec failed.
    #[error("frame transport error: {0}")]
    Transport(#[from] TransportError),

    /// An I/O error surfaced by an async codec driver.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True when a read or write deadline expired mid-frame.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_timeout())
    }

    /// True when the peer closed the stream before a complete frame arrived.
    pub fn is_premature_close(&self) -> bool {
        matches!(self, Self::Transport(TransportError::PrematureClose { .. }))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
