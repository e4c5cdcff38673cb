use std::fmt;

use tokio_tungstenite::tungstenite;

#[derive(Debug)]
pub enum TransportError {
    Io(std::io::Error),
    Handshake(String),
    Protocol(String),
    Capacity(String),
    Url(String),
    Closed,
    Other(String),
}

impl TransportError {
    /// Short classification logged next to the error description.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Io(_) => "IoError",
            TransportError::Handshake(_) => "HandshakeError",
            TransportError::Protocol(_) => "ProtocolError",
            TransportError::Capacity(_) => "CapacityError",
            TransportError::Url(_) => "UrlError",
            TransportError::Closed => "ConnectionClosed",
            TransportError::Other(_) => "TransportError",
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Io(e) => write!(f, "IO error: {}", e),
            TransportError::Handshake(e) => write!(f, "Handshake failed: {}", e),
            TransportError::Protocol(e) => write!(f, "Protocol violation: {}", e),
            TransportError::Capacity(e) => write!(f, "Capacity exceeded: {}", e),
            TransportError::Url(e) => write!(f, "Invalid URL: {}", e),
            TransportError::Closed => write!(f, "Connection already closed"),
            TransportError::Other(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

impl From<tungstenite::Error> for TransportError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::Closed
            }
            tungstenite::Error::Io(e) => TransportError::Io(e),
            tungstenite::Error::Protocol(e) => TransportError::Protocol(e.to_string()),
            tungstenite::Error::Capacity(e) => TransportError::Capacity(e.to_string()),
            tungstenite::Error::Url(e) => TransportError::Url(e.to_string()),
            tungstenite::Error::Http(response) => {
                TransportError::Handshake(format!("server answered HTTP {}", response.status()))
            }
            tungstenite::Error::HttpFormat(e) => TransportError::Handshake(e.to_string()),
            other => TransportError::Other(other.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum ProbeError {
    InvalidTarget(String),
    Serialization(serde_json::Error),
    Transport(TransportError),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::InvalidTarget(e) => write!(f, "Invalid WebSocket target: {}", e),
            ProbeError::Serialization(e) => write!(f, "Serialization error: {}", e),
            ProbeError::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for ProbeError {}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Serialization(err)
    }
}

impl From<TransportError> for ProbeError {
    fn from(err: TransportError) -> Self {
        ProbeError::Transport(err)
    }
}
