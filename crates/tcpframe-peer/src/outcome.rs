use bytes::Bytes;

use crate::error::{FailureKind, SessionError};

/// Process exit status for a fully successful session.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit status for any fatal session failure.
pub const EXIT_FAILURE: i32 = 1;

/// Terminal result of one accept/connect → exchange → close cycle.
///
/// For the responder, `Success` carries the request payload it received
/// (empty when no request was read). For the requester it carries the raw
/// response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Success(Bytes),
    Failure(SessionError),
}

impl SessionOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success(_) => EXIT_SUCCESS,
            Self::Failure(_) => EXIT_FAILURE,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err.kind),
        }
    }

    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Bytes, SessionError> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Failure(err) => Err(err),
        }
    }
}

impl From<Result<Bytes, SessionError>> for SessionOutcome {
    fn from(result: Result<Bytes, SessionError>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(err) => Self::Failure(err),
        }
    }
}
