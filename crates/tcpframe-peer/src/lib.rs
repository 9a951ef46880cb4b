//! Single-shot request/response roles over length-prefixed TCP frames.
//!
//! A [`Responder`] binds, accepts exactly one connection within a deadline,
//! reads one request frame, writes one response frame, and closes. A
//! [`Requester`] connects, sends one request, reads one response, and closes.
//! Both report a [`SessionOutcome`] that maps to a process exit status.

pub mod config;
pub mod error;
pub mod outcome;
pub mod request;
pub mod requester;
pub mod responder;

pub use config::{
    RequestPolicy, RequesterConfig, ResponderConfig, SessionLog, DEFAULT_ACCEPT_TIMEOUT,
    DEFAULT_ADDR, DEFAULT_IO_TIMEOUT, DEFAULT_PREVIEW_LIMIT, DEFAULT_RESPONSE,
};
pub use error::{FailureKind, Phase, Result, SessionError};
pub use outcome::{SessionOutcome, EXIT_FAILURE, EXIT_SUCCESS};
pub use request::{preview, CommandRequest, PayloadSummary, CMD_PING};
pub use requester::{decode_text, request_once, Requester};
pub use responder::{serve_once, Responder, ResponderState};
