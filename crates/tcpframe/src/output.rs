use std::io::{IsTerminal, Write};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tcpframe_peer::{PayloadSummary, SessionError, DEFAULT_PREVIEW_LIMIT};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    role: &'static str,
    addr: String,
    size: usize,
    response: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct ServedOutput {
    role: &'static str,
    addr: String,
    request_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_json: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_error: Option<RequestErrorOutput>,
    timestamp: String,
}

#[derive(Serialize)]
struct RequestErrorOutput {
    kind: &'static str,
    detail: String,
}

/// Print the decoded response a requester received.
pub fn print_response(addr: SocketAddr, response: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                role: "requester",
                addr: addr.to_string(),
                size: response.len(),
                response,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDR", "SIZE", "RESPONSE"])
                .add_row(vec![
                    addr.to_string(),
                    response.len().to_string(),
                    response.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "addr={} size={} response={}",
                addr,
                response.len(),
                response
            );
        }
        OutputFormat::Raw => print_raw(response.as_bytes()),
    }
}

/// Print what a responder received before it replied.
///
/// `tolerated` is the request read failure the responder answered anyway, so
/// an unreadable request is not reported as an empty one.
pub fn print_served(
    addr: SocketAddr,
    request: &[u8],
    tolerated: Option<&SessionError>,
    format: OutputFormat,
) {
    let summary = PayloadSummary::of(request, DEFAULT_PREVIEW_LIMIT);
    match format {
        OutputFormat::Json => {
            let (request_json, request_preview) = match summary {
                PayloadSummary::Json(value) => (Some(value), None),
                PayloadSummary::Raw { preview, .. } => (None, Some(preview)),
            };
            let out = ServedOutput {
                role: "responder",
                addr: addr.to_string(),
                request_size: request.len(),
                request_json,
                request_preview,
                request_error: tolerated.map(|err| RequestErrorOutput {
                    kind: err.kind.as_str(),
                    detail: err.detail.clone(),
                }),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDR", "REQUEST SIZE", "REQUEST"])
                .add_row(vec![
                    addr.to_string(),
                    request.len().to_string(),
                    request_text(&summary, tolerated),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "addr={} request_size={} request={}",
                addr,
                request.len(),
                request_text(&summary, tolerated)
            );
        }
        OutputFormat::Raw => print_raw(request),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn request_text(summary: &PayloadSummary, tolerated: Option<&SessionError>) -> String {
    match tolerated {
        Some(err) => format!("<unreadable: {}>", err.kind),
        None => summary_text(summary),
    }
}

fn summary_text(summary: &PayloadSummary) -> String {
    match summary {
        PayloadSummary::Json(value) => value.to_string(),
        PayloadSummary::Raw { preview, .. } if preview.is_empty() => "<none>".to_string(),
        PayloadSummary::Raw { preview, .. } => preview.clone(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
