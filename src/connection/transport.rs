//! Transport seam between the lifecycle manager and the WebSocket library.
//!
//! The manager only talks to the two traits below. [`WsConnector`] and
//! [`WsLink`] implement them on top of `tokio-tungstenite`; tests plug in
//! scripted implementations to drive the state machine deterministically.

use crate::configuration::config::SessionConfig;
use crate::error_handling::types::{ProbeError, TransportError};
use futures_util::{SinkExt, StreamExt};
use log::{debug, trace};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, USER_AGENT};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::types::{CloseInfo, TransportEvent};

/// Upper bound on waiting for the server to drop the TCP connection once
/// the close handshake has been answered.
const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens new sessions against one fixed target.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Link: Link;

    /// URL every attempt connects to, for logging.
    fn target(&self) -> &str;

    /// Performs the handshake. Errors are reported and retried by the
    /// caller, they are never fatal.
    async fn connect(&self) -> Result<Self::Link, TransportError>;
}

/// One open WebSocket session.
#[allow(async_fn_in_trait)]
pub trait Link {
    /// Waits for the next inbound event.
    ///
    /// Must be cancel-safe: the manager races it against timers and the
    /// shutdown signal. After [`TransportEvent::Closed`] it is not polled
    /// again. A [`TransportEvent::Error`] does not end the session, closure
    /// is always reported separately through `Closed`.
    async fn next_event(&mut self) -> TransportEvent;

    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Sends a protocol-level Ping control frame.
    async fn send_keepalive(&mut self) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

pub struct WsConnector {
    target: String,
    user_agent: HeaderValue,
}

impl WsConnector {
    /// Validates the target URL and handshake headers once, so a bad host
    /// fails the setup instead of looping forever.
    pub fn new(config: &SessionConfig) -> Result<Self, ProbeError> {
        let target = config.target_url();
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ProbeError::InvalidTarget(format!("bad User-Agent: {}", e)))?;

        let connector = Self { target, user_agent };
        connector
            .request()
            .map_err(|e| ProbeError::InvalidTarget(format!("{}: {}", connector.target, e)))?;

        Ok(connector)
    }

    fn request(&self) -> Result<Request, TransportError> {
        let mut request = self.target.as_str().into_client_request()?;
        request
            .headers_mut()
            .insert(USER_AGENT, self.user_agent.clone());
        Ok(request)
    }
}

impl Connector for WsConnector {
    type Link = WsLink;

    fn target(&self) -> &str {
        &self.target
    }

    async fn connect(&self) -> Result<WsLink, TransportError> {
        let (stream, response) = connect_async(self.request()?).await?;
        debug!(
            "Handshake with {} answered {}",
            self.target,
            response.status()
        );
        Ok(WsLink::new(stream))
    }
}

pub struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    errored: bool,
}

impl WsLink {
    fn new(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self {
            stream,
            errored: false,
        }
    }

    /// tungstenite only queues the reply to a peer Close frame; it goes out
    /// on the next read. Keep reading until the server ends the stream.
    async fn finish_close(&mut self) {
        let drain = async {
            while let Some(Ok(frame)) = self.stream.next().await {
                trace!("Frame after close: {:?}", frame);
            }
        };
        if timeout(CLOSE_DRAIN_TIMEOUT, drain).await.is_err() {
            debug!("Server kept the connection open after the close handshake");
        }
    }
}

impl Link for WsLink {
    async fn next_event(&mut self) -> TransportEvent {
        if self.errored {
            return TransportEvent::Closed(CloseInfo::abnormal());
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return TransportEvent::Text(text.as_str().to_owned())
                }
                Some(Ok(Message::Binary(payload))) => {
                    return TransportEvent::Binary(payload.to_vec())
                }
                Some(Ok(Message::Close(frame))) => {
                    let info = match frame {
                        Some(frame) => CloseInfo::new(u16::from(frame.code), &*frame.reason),
                        None => CloseInfo::no_status(),
                    };
                    self.finish_close().await;
                    return TransportEvent::Closed(info);
                }
                Some(Ok(control)) => {
                    // Pings are answered by tungstenite itself.
                    trace!("Control frame: {:?}", control);
                }
                Some(Err(e)) => {
                    self.errored = true;
                    return TransportEvent::Error(TransportError::from(e));
                }
                None => return TransportEvent::Closed(CloseInfo::abnormal()),
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    async fn send_keepalive(&mut self) -> Result<(), TransportError> {
        self.stream.send(Message::Ping(Default::default())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(e) => match TransportError::from(e) {
                TransportError::Closed => Ok(()),
                other => Err(other),
            },
        }
    }
}
