use std::net::SocketAddr;

use bytes::Bytes;
use tcpframe_frame::{read_frame_from, write_frame_to, FrameConfig};
use tcpframe_transport::{Connection, TcpTransport};
use tracing::{debug, info, info_span, warn};

use crate::config::{RequestPolicy, ResponderConfig, SessionLog};
use crate::error::{FailureKind, Phase, Result, SessionError};
use crate::outcome::SessionOutcome;
use crate::request::PayloadSummary;

/// Lifecycle of a single-shot responder.
///
/// `Listening → Accepted → Served → Closed` on success, `Listening → TimedOut`
/// when nobody connects, `Failed` for any other fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderState {
    Listening,
    Accepted,
    Served,
    Closed,
    TimedOut,
    Failed,
}

impl ResponderState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::TimedOut | Self::Failed)
    }
}

/// Binds one address, serves one connection, then releases everything.
pub struct Responder {
    listener: Option<TcpTransport>,
    local_addr: SocketAddr,
    config: ResponderConfig,
    history: Vec<ResponderState>,
    tolerated: Option<SessionError>,
}

impl Responder {
    /// Bind and listen on `config.bind_addr`.
    pub fn bind(config: ResponderConfig) -> Result<Self> {
        let listener = TcpTransport::bind_with_backlog(config.bind_addr, config.backlog)
            .map_err(|err| SessionError::from_transport(Phase::Bind, err))?;
        let local_addr = listener.local_addr();
        info!(
            addr = %local_addr,
            session = %config.log.session,
            "listening"
        );
        Ok(Self {
            listener: Some(listener),
            local_addr,
            config,
            history: vec![ResponderState::Listening],
            tolerated: None,
        })
    }

    /// Bound address, with the real port if `0` was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> ResponderState {
        self.history
            .last()
            .copied()
            .unwrap_or(ResponderState::Listening)
    }

    /// Every state visited so far, in order.
    pub fn history(&self) -> &[ResponderState] {
        &self.history
    }

    /// Request read failure that the lenient policy answered anyway.
    ///
    /// `None` after a request was read, even an empty one, and always `None`
    /// under the strict policy.
    pub fn tolerated_failure(&self) -> Option<&SessionError> {
        self.tolerated.as_ref()
    }

    /// Accept one connection, exchange one frame pair, close.
    ///
    /// The listening socket is released before this returns, whatever the
    /// result. A second call fails without touching the network.
    pub fn serve_once(&mut self) -> SessionOutcome {
        let Some(listener) = self.listener.take() else {
            return SessionOutcome::Failure(SessionError::new(
                FailureKind::TransportError,
                Phase::Accept,
                "responder already served its connection",
            ));
        };

        let span = info_span!("responder", session = %self.config.log.session);
        let _guard = span.enter();

        let accepted = listener.accept(self.config.accept_timeout);
        drop(listener);

        let mut conn = match accepted {
            Ok(conn) => conn,
            Err(err) => {
                let failure = SessionError::from_transport(Phase::Accept, err);
                if failure.kind == FailureKind::AcceptTimeout {
                    info!(timeout = ?self.config.accept_timeout, "no client connected");
                    self.transition(ResponderState::TimedOut);
                } else {
                    self.transition(ResponderState::Failed);
                }
                return SessionOutcome::Failure(failure);
            }
        };
        info!(peer = %conn.peer_addr(), "accepted");
        self.transition(ResponderState::Accepted);

        let outcome: SessionOutcome = self.exchange(&mut conn).into();
        conn.close();
        if matches!(outcome, SessionOutcome::Success(_)) {
            self.transition(ResponderState::Closed);
            info!("closed");
        } else {
            self.transition(ResponderState::Failed);
        }
        outcome
    }

    fn exchange(&mut self, conn: &mut Connection) -> Result<Bytes> {
        let frame_config = self.config.frame_config();

        let request = if self.config.expect_request {
            match read_request(conn, &frame_config, &self.config.log) {
                Ok(request) => request,
                Err(failure) if self.config.request_policy == RequestPolicy::Lenient => {
                    warn!(
                        kind = %failure.kind,
                        error = %failure.detail,
                        "request not read; responding anyway"
                    );
                    self.tolerated = Some(failure);
                    Bytes::new()
                }
                Err(failure) => return Err(failure),
            }
        } else {
            debug!("push-only session; not reading a request");
            Bytes::new()
        };

        write_frame_to(conn, &self.config.response, &frame_config)
            .map_err(|err| SessionError::from_frame(Phase::SendResponse, err))?;
        info!(size = self.config.response.len(), "response sent");
        self.transition(ResponderState::Served);

        conn.shutdown_write();
        Ok(request)
    }

    fn transition(&mut self, next: ResponderState) {
        debug!(from = ?self.state(), to = ?next, "responder state");
        self.history.push(next);
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("local_addr", &self.local_addr)
            .field("state", &self.state())
            .finish()
    }
}

fn read_request(
    conn: &mut Connection,
    frame_config: &FrameConfig,
    log: &SessionLog,
) -> Result<Bytes> {
    let frame = read_frame_from(conn, frame_config)
        .map_err(|err| SessionError::from_frame(Phase::ReadRequest, err))?;
    log_request(&frame.payload, log);
    Ok(frame.into_payload())
}

fn log_request(payload: &[u8], log: &SessionLog) {
    match PayloadSummary::of(payload, log.preview_limit) {
        PayloadSummary::Json(value) => info!(request_json = %value, "request received"),
        PayloadSummary::Raw { size, preview } => {
            info!(size, request_preview = %preview, "request received (raw)")
        }
    }
}

/// Bind, serve exactly one connection, and report the outcome.
pub fn serve_once(config: &ResponderConfig) -> SessionOutcome {
    match Responder::bind(config.clone()) {
        Ok(mut responder) => responder.serve_once(),
        Err(err) => SessionOutcome::Failure(err),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{ErrorKind, Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::config::RequesterConfig;
    use crate::requester::Requester;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().expect("loopback address should parse")
    }

    fn responder(config: ResponderConfig) -> Responder {
        Responder::bind(ResponderConfig {
            bind_addr: loopback(),
            ..config
        })
        .expect("responder should bind")
    }

    fn requester_for(addr: SocketAddr) -> RequesterConfig {
        RequesterConfig {
            remote_addr: addr,
            io_timeout: Duration::from_secs(2),
            ..RequesterConfig::default()
        }
    }

    fn read_raw_frame(stream: &mut TcpStream) -> Vec<u8> {
        let mut header = [0u8; 4];
        stream
            .read_exact(&mut header)
            .expect("header should arrive");
        let mut body = vec![0u8; u32::from_be_bytes(header) as usize];
        stream.read_exact(&mut body).expect("body should arrive");
        body
    }

    #[test]
    fn ping_gets_canned_response() {
        let mut responder = responder(ResponderConfig::default());
        let addr = responder.local_addr();

        let server = thread::spawn(move || {
            let outcome = responder.serve_once();
            (outcome, responder)
        });

        let client = Requester::new(requester_for(addr)).exchange();
        let (outcome, responder) = server.join().expect("server thread should finish");

        assert_eq!(client.exit_code(), 0);
        assert_eq!(
            client.payload().map(Bytes::as_ref),
            Some(&b"Hello, client!"[..])
        );
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(
            outcome.payload().map(Bytes::as_ref),
            Some(&br#"{"cmd":"ping"}"#[..])
        );
        assert_eq!(
            responder.history(),
            &[
                ResponderState::Listening,
                ResponderState::Accepted,
                ResponderState::Served,
                ResponderState::Closed,
            ]
        );
    }

    #[test]
    fn accept_timeout_is_reported() {
        let mut responder = responder(ResponderConfig {
            accept_timeout: Duration::from_millis(50),
            ..ResponderConfig::default()
        });

        let outcome = responder.serve_once();
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(outcome.failure_kind(), Some(FailureKind::AcceptTimeout));
        assert_eq!(
            responder.history(),
            &[ResponderState::Listening, ResponderState::TimedOut]
        );
        assert!(responder.state().is_terminal());
    }

    #[test]
    fn listener_released_after_serving() {
        let mut responder = responder(ResponderConfig {
            accept_timeout: Duration::from_millis(20),
            ..ResponderConfig::default()
        });
        let addr = responder.local_addr();
        let _ = responder.serve_once();

        TcpListener::bind(addr).expect("address should be free again");
    }

    #[test]
    fn second_serve_fails_without_network() {
        let mut responder = responder(ResponderConfig {
            accept_timeout: Duration::from_millis(20),
            ..ResponderConfig::default()
        });
        let _ = responder.serve_once();

        let again = responder.serve_once();
        assert_eq!(again.failure_kind(), Some(FailureKind::TransportError));
    }

    #[test]
    fn bind_conflict_is_bind_error() {
        let taken = TcpListener::bind(loopback()).expect("first listener should bind");
        let addr = taken.local_addr().expect("first listener should have an address");

        let outcome = serve_once(&ResponderConfig {
            bind_addr: addr,
            ..ResponderConfig::default()
        });
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(outcome.failure_kind(), Some(FailureKind::BindError));
    }

    #[test]
    fn lenient_policy_still_responds_to_bad_request() {
        let mut responder = responder(ResponderConfig {
            max_frame_size: 8,
            ..ResponderConfig::default()
        });
        let addr = responder.local_addr();
        let server = thread::spawn(move || {
            let outcome = responder.serve_once();
            (outcome, responder)
        });

        let mut raw = TcpStream::connect(addr).expect("client should connect");
        raw.set_read_timeout(Some(Duration::from_secs(2)))
            .expect("timeout should apply");
        raw.write_all(&100u32.to_be_bytes())
            .expect("header should send");

        assert_eq!(read_raw_frame(&mut raw), b"Hello, client!");
        let (outcome, responder) = server.join().expect("server thread should finish");
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(outcome.payload().map(Bytes::len), Some(0));
        let tolerated = responder
            .tolerated_failure()
            .expect("unreadable request should be recorded");
        assert_eq!(tolerated.kind, FailureKind::FrameTooLarge);
        assert_eq!(tolerated.phase, Phase::ReadRequest);
    }

    #[test]
    fn empty_request_is_not_a_tolerated_failure() {
        let mut responder = responder(ResponderConfig::default());
        let addr = responder.local_addr();
        let server = thread::spawn(move || {
            let outcome = responder.serve_once();
            (outcome, responder)
        });

        let text = Requester::new(RequesterConfig {
            request: Some(Bytes::new()),
            ..requester_for(addr)
        })
        .request_text()
        .expect("empty request should still be answered");
        assert_eq!(text, "Hello, client!");

        let (outcome, responder) = server.join().expect("server thread should finish");
        assert_eq!(outcome.payload().map(Bytes::len), Some(0));
        assert!(responder.tolerated_failure().is_none());
    }

    #[test]
    fn response_larger_than_request_limit_is_sent() {
        let mut responder = responder(ResponderConfig {
            max_frame_size: 8,
            ..ResponderConfig::default()
        });
        let addr = responder.local_addr();
        let server = thread::spawn(move || {
            let outcome = responder.serve_once();
            (outcome, responder)
        });

        let client = Requester::new(RequesterConfig {
            request: Some(Bytes::from_static(b"{}")),
            ..requester_for(addr)
        })
        .exchange();
        let (outcome, responder) = server.join().expect("server thread should finish");

        assert_eq!(client.exit_code(), 0);
        assert_eq!(
            client.payload().map(Bytes::as_ref),
            Some(&b"Hello, client!"[..])
        );
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(outcome.payload().map(Bytes::as_ref), Some(&b"{}"[..]));
        assert!(responder.tolerated_failure().is_none());
        assert_eq!(responder.state(), ResponderState::Closed);
    }

    #[test]
    fn strict_policy_fails_without_responding() {
        let mut responder = responder(ResponderConfig {
            max_frame_size: 8,
            request_policy: RequestPolicy::Strict,
            ..ResponderConfig::default()
        });
        let addr = responder.local_addr();
        let server = thread::spawn(move || {
            let outcome = responder.serve_once();
            (outcome, responder.state())
        });

        let mut raw = TcpStream::connect(addr).expect("client should connect");
        raw.set_read_timeout(Some(Duration::from_secs(2)))
            .expect("timeout should apply");
        raw.write_all(&100u32.to_be_bytes())
            .expect("header should send");

        let (outcome, state) = server.join().expect("server thread should finish");
        assert_eq!(outcome.failure_kind(), Some(FailureKind::FrameTooLarge));
        assert_eq!(state, ResponderState::Failed);

        let mut rest = Vec::new();
        let _ = raw.read_to_end(&mut rest);
        assert!(rest.is_empty());
    }

    #[test]
    fn silent_client_times_out_strictly() {
        let mut responder = responder(ResponderConfig {
            io_timeout: Duration::from_millis(50),
            request_policy: RequestPolicy::Strict,
            ..ResponderConfig::default()
        });
        let addr = responder.local_addr();
        let server = thread::spawn(move || responder.serve_once());

        let mut raw = TcpStream::connect(addr).expect("client should connect");
        let outcome = server.join().expect("server thread should finish");
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Timeout));

        // The timed-out connection is closed, not left open for reuse.
        raw.set_read_timeout(Some(Duration::from_secs(2)))
            .expect("timeout should apply");
        let mut buf = [0u8; 1];
        match raw.read(&mut buf) {
            Ok(n) => assert_eq!(n, 0, "responder should send nothing after timing out"),
            Err(err) => assert!(
                !matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
                "connection still open after timeout: {err}"
            ),
        }
    }

    #[test]
    fn push_only_sends_immediately() {
        let mut responder = responder(ResponderConfig {
            expect_request: false,
            response: Bytes::from_static(b"pushed"),
            ..ResponderConfig::default()
        });
        let addr = responder.local_addr();
        let server = thread::spawn(move || responder.serve_once());

        let client = Requester::new(RequesterConfig {
            request: None,
            ..requester_for(addr)
        })
        .request_text()
        .expect("pushed response should decode");

        assert_eq!(client, "pushed");
        let outcome = server.join().expect("server thread should finish");
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn session_label_reaches_log_output() {
        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().expect("log buffer lock").extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut responder = responder(ResponderConfig {
                accept_timeout: Duration::from_millis(20),
                log: SessionLog::new("alpha"),
                ..ResponderConfig::default()
            });
            let _ = responder.serve_once();
        });

        let text = String::from_utf8(captured.0.lock().expect("log buffer lock").clone())
            .expect("log output should be UTF-8");
        assert!(text.contains("session=alpha"), "log output: {text}");
        assert!(text.contains("no client connected"), "log output: {text}");
    }
}
