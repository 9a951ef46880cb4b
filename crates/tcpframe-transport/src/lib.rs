//! TCP transport with deadline-bounded I/O.
//!
//! This is the lowest layer of tcpframe:
//! - [`TcpTransport`] binds, accepts (with an accept deadline) and connects
//! - [`Connection`] owns one stream and tracks its half-close state
//! - [`bounded`] reads exactly N bytes / writes all bytes within a deadline
//!
//! Everything else builds on top of the [`TimeoutStream`] trait defined here.

pub mod bounded;
pub mod connection;
pub mod error;
pub mod tcp;
pub mod traits;

pub use bounded::{read_exact, read_exact_into, write_all, Deadline};
pub use connection::{Connection, HalfCloseState};
pub use error::{Result, TransportError};
pub use tcp::{resolve, TcpTransport};
pub use traits::TimeoutStream;
