use std::fs;

use bytes::Bytes;
use tcpframe_peer::{decode_text, CommandRequest, Requester, RequesterConfig, SessionLog};
use tcpframe_transport::resolve;
use tracing::error;

use crate::cmd::{parse_duration, RequestArgs};
use crate::exit::{address_error, io_error, session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let config = requester_config(&args)?;
    let addr = config.remote_addr;

    let text = Requester::new(config)
        .exchange()
        .into_result()
        .and_then(decode_text)
        .map_err(|err| {
            error!(kind = %err.kind, phase = %err.phase, "request session failed");
            session_error("request", &err)
        })?;

    print_response(addr, &text, format);
    Ok(SUCCESS)
}

fn requester_config(args: &RequestArgs) -> CliResult<RequesterConfig> {
    Ok(RequesterConfig {
        remote_addr: resolve(&args.addr).map_err(address_error)?,
        connect_timeout: Some(parse_duration(&args.connect_timeout)?),
        io_timeout: parse_duration(&args.io_timeout)?,
        max_frame_size: args.max_frame_size,
        request: resolve_payload(args)?,
        log: SessionLog::new(args.session.clone()),
    })
}

fn resolve_payload(args: &RequestArgs) -> CliResult<Option<Bytes>> {
    if args.no_request {
        return Ok(None);
    }
    if let Some(json) = &args.json {
        serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(Some(Bytes::from(json.clone().into_bytes())));
    }
    if let Some(data) = &args.data {
        return Ok(Some(Bytes::from(data.clone().into_bytes())));
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map(|bytes| Some(Bytes::from(bytes)))
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    CommandRequest::ping()
        .to_bytes()
        .map(Some)
        .map_err(|err| CliError::new(crate::exit::INTERNAL, format!("encode request: {err}")))
}
