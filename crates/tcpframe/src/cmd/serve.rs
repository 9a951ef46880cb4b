use bytes::Bytes;
use tcpframe_peer::{RequestPolicy, Responder, ResponderConfig, SessionLog, SessionOutcome};
use tcpframe_transport::resolve;
use tracing::error;

use crate::cmd::{parse_duration, ServeArgs};
use crate::exit::{address_error, session_error, CliResult, SUCCESS};
use crate::output::{print_served, OutputFormat};

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = responder_config(&args)?;
    let mut responder = Responder::bind(config).map_err(|err| session_error("serve", &err))?;
    let addr = responder.local_addr();

    match responder.serve_once() {
        SessionOutcome::Success(request) => {
            print_served(addr, &request, responder.tolerated_failure(), format);
            Ok(SUCCESS)
        }
        SessionOutcome::Failure(err) => {
            error!(kind = %err.kind, state = ?responder.state(), "serve session failed");
            Err(session_error("serve", &err))
        }
    }
}

fn responder_config(args: &ServeArgs) -> CliResult<ResponderConfig> {
    Ok(ResponderConfig {
        bind_addr: resolve(&args.addr).map_err(address_error)?,
        accept_timeout: parse_duration(&args.accept_timeout)?,
        io_timeout: parse_duration(&args.io_timeout)?,
        max_frame_size: args.max_frame_size,
        response: Bytes::from(args.response.clone().into_bytes()),
        request_policy: if args.strict {
            RequestPolicy::Strict
        } else {
            RequestPolicy::Lenient
        },
        expect_request: !args.no_request,
        backlog: args.backlog,
        log: SessionLog::new(args.session.clone()),
    })
}
