//! One responder, one requester, one exchange on a loopback port.
//!
//! Run with:
//!   cargo run --example ping-pong
//!
//! Or across two terminals with the CLI:
//!   cargo run --features cli -- serve 127.0.0.1:5000
//!   cargo run --features cli -- request 127.0.0.1:5000 --format pretty

use std::thread;

use tcpframe::peer::{Requester, RequesterConfig, Responder, ResponderConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut responder = Responder::bind(ResponderConfig {
        bind_addr: "127.0.0.1:0".parse()?,
        ..ResponderConfig::default()
    })?;
    let addr = responder.local_addr();
    eprintln!("Listening on {addr}");

    let server = thread::spawn(move || {
        let outcome = responder.serve_once();
        eprintln!("Responder finished in state {:?}", responder.state());
        outcome
    });

    let reply = Requester::new(RequesterConfig {
        remote_addr: addr,
        ..RequesterConfig::default()
    })
    .request_text()?;
    eprintln!("Requester got: {reply}");

    let outcome = server
        .join()
        .map_err(|_| "responder thread panicked")?;
    std::process::exit(outcome.exit_code());
}
