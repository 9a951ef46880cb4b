use std::fmt;
use std::io;

use tcpframe_peer::SessionError;
use tcpframe_transport::TransportError;

pub const SUCCESS: i32 = 0;
/// Any fatal session failure (bind, accept timeout, connect, I/O, framing, decode).
pub const FAILURE: i32 = 1;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn address_error(err: TransportError) -> CliError {
    match err {
        TransportError::InvalidAddress { .. } => CliError::usage(err.to_string()),
        other => CliError::new(INTERNAL, other.to_string()),
    }
}

pub fn session_error(role: &str, err: &SessionError) -> CliError {
    CliError::new(FAILURE, format!("{role}: {err}"))
}
