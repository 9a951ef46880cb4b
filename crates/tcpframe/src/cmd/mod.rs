use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod request;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept one connection, read one request, send one response.
    Serve(ServeArgs),
    /// Connect, send one request, print the response.
    Request(RequestArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Request(args) => request::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (host:port).
    #[arg(env = "TCPFRAME_ADDR", default_value = "127.0.0.1:5000")]
    pub addr: String,
    /// Response payload sent to the client.
    #[arg(long, env = "TCPFRAME_RESPONSE", default_value = "Hello, client!")]
    pub response: String,
    /// How long to wait for a client (e.g. 15s, 500ms).
    #[arg(long, env = "TCPFRAME_ACCEPT_TIMEOUT", default_value = "15s")]
    pub accept_timeout: String,
    /// Deadline for each read and write.
    #[arg(long, env = "TCPFRAME_IO_TIMEOUT", default_value = "5s")]
    pub io_timeout: String,
    /// Largest accepted request payload in bytes.
    #[arg(long, env = "TCPFRAME_MAX_FRAME_SIZE", default_value_t = tcpframe_frame::DEFAULT_MAX_PAYLOAD)]
    pub max_frame_size: usize,
    /// Fail the session instead of responding when the request cannot be read.
    #[arg(long)]
    pub strict: bool,
    /// Push the response right after accept without reading a request.
    #[arg(long, conflicts_with = "strict")]
    pub no_request: bool,
    /// Pending-connection queue length.
    #[arg(long, default_value_t = 1)]
    pub backlog: i32,
    /// Label attached to this session's log lines.
    #[arg(long, default_value = "serve")]
    pub session: String,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Address to connect to (host:port).
    #[arg(env = "TCPFRAME_ADDR", default_value = "127.0.0.1:5000")]
    pub addr: String,
    /// JSON request payload. Default: {"cmd":"ping"}.
    #[arg(long, conflicts_with_all = ["data", "file", "no_request"])]
    pub json: Option<String>,
    /// Raw string request payload.
    #[arg(long, conflicts_with_all = ["json", "file", "no_request"])]
    pub data: Option<String>,
    /// Read the request payload from a file.
    #[arg(long, conflicts_with_all = ["json", "data", "no_request"])]
    pub file: Option<PathBuf>,
    /// Send nothing; only read a pushed response.
    #[arg(long)]
    pub no_request: bool,
    /// Deadline for each read and write.
    #[arg(long, env = "TCPFRAME_IO_TIMEOUT", default_value = "5s")]
    pub io_timeout: String,
    /// Deadline for establishing the connection.
    #[arg(long, env = "TCPFRAME_CONNECT_TIMEOUT", default_value = "5s")]
    pub connect_timeout: String,
    /// Largest accepted response payload in bytes.
    #[arg(long, env = "TCPFRAME_MAX_FRAME_SIZE", default_value_t = tcpframe_frame::DEFAULT_MAX_PAYLOAD)]
    pub max_frame_size: usize,
    /// Label attached to this session's log lines.
    #[arg(long, default_value = "request")]
    pub session: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `5s`, or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
