//! Single-shot request/response over length-prefixed TCP frames.
//!
//! Every message on the wire is a 4-byte big-endian length followed by that
//! many payload bytes. One side listens and serves exactly one connection;
//! the other connects, sends one request, and reads one response.
//!
//! # Crate Structure
//!
//! - [`transport`] - TCP listener, connection handle, deadline-bounded I/O
//! - [`frame`] - Length-prefixed framing codec with size validation
//! - [`peer`] - Responder and Requester roles (behind `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use tcpframe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use tcpframe_frame::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use tcpframe_peer::*;
}
