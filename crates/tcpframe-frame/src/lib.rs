//! Length-prefixed message framing over TCP.
//!
//! Every message is framed with a 4-byte big-endian payload length followed
//! by exactly that many payload bytes. Receivers validate the declared length
//! against a configured maximum before reading the body.
//!
//! No partial reads, no buffer management in user code.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use codec::{
    decode_frame, decode_header, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD,
    HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::{read_frame_from, FrameReader};
pub use writer::{write_frame_to, FrameWriter};
