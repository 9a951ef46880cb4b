use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Command tag of the default request.
pub const CMD_PING: &str = "ping";

/// Structured request payload: a small JSON object carrying a command tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandRequest {
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,
}

impl CommandRequest {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            args: None,
        }
    }

    /// The `{"cmd":"ping"}` request.
    pub fn ping() -> Self {
        Self::new(CMD_PING)
    }

    /// Serialize to UTF-8 JSON bytes.
    pub fn to_bytes(&self) -> serde_json::Result<Bytes> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}

/// Diagnostic view of a received payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadSummary {
    /// The payload parsed as JSON.
    Json(serde_json::Value),
    /// Anything else: total size plus an escaped prefix of at most the preview limit.
    Raw { size: usize, preview: String },
}

impl PayloadSummary {
    /// Interpret `payload` for logging only. Never fails.
    pub fn of(payload: &[u8], preview_limit: usize) -> Self {
        match serde_json::from_slice(payload) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Raw {
                size: payload.len(),
                preview: preview(payload, preview_limit),
            },
        }
    }
}

/// Escaped, length-bounded rendering of arbitrary bytes.
pub fn preview(payload: &[u8], limit: usize) -> String {
    let end = payload.len().min(limit);
    payload[..end].escape_ascii().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_serializes_as_command_tag() {
        let bytes = CommandRequest::ping().to_bytes().unwrap();
        assert_eq!(bytes.as_ref(), br#"{"cmd":"ping"}"#);
    }

    #[test]
    fn args_roundtrip() {
        let req = CommandRequest {
            cmd: "echo".to_string(),
            args: Some(serde_json::json!({ "text": "hi" })),
        };
        let bytes = req.to_bytes().unwrap();
        let back: CommandRequest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn summary_prefers_json() {
        let summary = PayloadSummary::of(br#"{"cmd":"ping"}"#, 200);
        assert_eq!(
            summary,
            PayloadSummary::Json(serde_json::json!({ "cmd": "ping" }))
        );
    }

    #[test]
    fn summary_falls_back_to_bounded_preview() {
        let summary = PayloadSummary::of(b"\x00\x01plain text", 4);
        assert_eq!(
            summary,
            PayloadSummary::Raw {
                size: 12,
                preview: "\\x00\\x01pl".to_string()
            }
        );
    }
}
