use bytes::Bytes;
use tcpframe_frame::{read_frame_from, write_frame_to};
use tcpframe_transport::{Connection, TcpTransport};
use tracing::{debug, info, info_span};

use crate::config::RequesterConfig;
use crate::error::{FailureKind, Phase, Result, SessionError};
use crate::outcome::SessionOutcome;

/// Connects once, sends one request, reads one response.
#[derive(Debug, Clone)]
pub struct Requester {
    config: RequesterConfig,
}

impl Requester {
    pub fn new(config: RequesterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RequesterConfig {
        &self.config
    }

    /// Run one exchange and return the raw response payload.
    pub fn exchange(&self) -> SessionOutcome {
        let span = info_span!("requester", session = %self.config.log.session);
        let _guard = span.enter();
        self.run().into()
    }

    /// Run one exchange and decode the response as UTF-8 text.
    pub fn request_text(&self) -> Result<String> {
        let payload = self.exchange().into_result()?;
        decode_text(payload)
    }

    fn run(&self) -> Result<Bytes> {
        let addr = self.config.remote_addr;
        let mut conn = TcpTransport::connect(addr, self.config.connect_timeout)
            .map_err(|err| SessionError::from_transport(Phase::Connect, err))?;
        info!(%addr, "connected");

        let result = self.exchange_on(&mut conn);
        conn.close();
        result
    }

    fn exchange_on(&self, conn: &mut Connection) -> Result<Bytes> {
        let frame_config = self.config.frame_config();

        match &self.config.request {
            Some(request) => {
                write_frame_to(conn, request, &frame_config)
                    .map_err(|err| SessionError::from_frame(Phase::SendRequest, err))?;
                debug!(size = request.len(), "request sent");
            }
            None => debug!("no request configured; waiting for pushed response"),
        }

        let frame = read_frame_from(conn, &frame_config)
            .map_err(|err| SessionError::from_frame(Phase::ReadResponse, err))?;
        info!(size = frame.payload.len(), "response received");
        Ok(frame.into_payload())
    }
}

/// Decode a response payload as UTF-8.
pub fn decode_text(payload: Bytes) -> Result<String> {
    String::from_utf8(payload.to_vec()).map_err(|err| {
        SessionError::new(
            FailureKind::PayloadDecodeError,
            Phase::DecodePayload,
            format!("invalid UTF-8 at byte {}", err.utf8_error().valid_up_to()),
        )
    })
}

/// Connect, exchange one frame pair, and return the decoded response text.
pub fn request_once(config: &RequesterConfig) -> Result<String> {
    Requester::new(config.clone()).request_text()
}
