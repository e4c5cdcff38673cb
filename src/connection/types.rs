//! Value types shared by the transport seam and the lifecycle manager.

use crate::configuration::types::Status;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// Position of the manager in the reconnect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Disconnected,
    Connecting,
    Open,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Disconnected => write!(f, "Disconnected"),
            LifecycleState::Connecting => write!(f, "Connecting"),
            LifecycleState::Open => write!(f, "Open"),
        }
    }
}

/// What a [`Link`](super::transport::Link) hands back while it is waited on.
#[derive(Debug)]
pub enum TransportEvent {
    Text(String),
    Binary(Vec<u8>),
    Error(crate::error_handling::types::TransportError),
    Closed(CloseInfo),
}

/// An inbound data frame, decoded as far as it can be.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Json(Value),
    Text { raw: String, length: usize },
}

impl InboundMessage {
    /// Decodes `text` as JSON, falling back to the raw text.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => InboundMessage::Json(value),
            Err(_) => InboundMessage::Text {
                raw: text.to_string(),
                length: text.chars().count(),
            },
        }
    }

    /// UTF-8 payloads follow the text path; anything else is shown lossily
    /// and measured in bytes.
    pub fn from_binary(payload: &[u8]) -> (Self, usize) {
        match std::str::from_utf8(payload) {
            Ok(text) => (InboundMessage::from_text(text), text.chars().count()),
            Err(_) => (
                InboundMessage::Text {
                    raw: String::from_utf8_lossy(payload).into_owned(),
                    length: payload.len(),
                },
                payload.len(),
            ),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, InboundMessage::Json(_))
    }

    /// The form written to the log: the decoded value, or `{raw, length}`.
    pub fn log_value(&self) -> Value {
        match self {
            InboundMessage::Json(value) => value.clone(),
            InboundMessage::Text { raw, length } => json!({ "raw": raw, "length": length }),
        }
    }
}

/// Diagnostic payload sent once per session, shortly after the handshake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingPayload {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub timestamp: i64,
    pub line: i64,
    pub status: Status,
}

impl PingPayload {
    pub fn new(line: i64, status: Status) -> Self {
        Self {
            kind: "ping",
            timestamp: Utc::now().timestamp_millis(),
            line,
            status,
        }
    }
}

pub const CLOSE_NORMAL: u16 = 1000;
pub const CLOSE_NO_STATUS: u16 = 1005;
pub const CLOSE_ABNORMAL: u16 = 1006;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: Option<String>,
}

impl CloseInfo {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            code,
            reason: if reason.is_empty() { None } else { Some(reason) },
        }
    }

    /// The transport went away without a close frame.
    pub fn abnormal() -> Self {
        Self {
            code: CLOSE_ABNORMAL,
            reason: None,
        }
    }

    /// A close frame arrived without a status code.
    pub fn no_status() -> Self {
        Self {
            code: CLOSE_NO_STATUS,
            reason: None,
        }
    }

    pub fn reason_or_default(&self) -> &str {
        self.reason.as_deref().unwrap_or("No reason provided")
    }

    pub fn meaning(&self) -> &'static str {
        close_code_meaning(self.code)
    }
}

/// Standard meaning of a WebSocket close code, `Unknown` otherwise.
pub fn close_code_meaning(code: u16) -> &'static str {
    match code {
        1000 => "Normal Closure",
        1001 => "Going Away",
        1002 => "Protocol Error",
        1003 => "Unsupported Data",
        1004 => "Reserved",
        1005 => "No Status Received",
        1006 => "Abnormal Closure",
        1007 => "Invalid Frame Payload Data",
        1008 => "Policy Violation",
        1009 => "Message Too Big",
        1010 => "Mandatory Extension",
        1011 => "Internal Server Error",
        1012 => "Service Restart",
        1013 => "Try Again Later",
        1014 => "Bad Gateway",
        1015 => "TLS Handshake",
        _ => "Unknown",
    }
}

/// Process-lifetime totals, reported when the probe shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub attempts: u64,
    pub sessions_opened: u64,
    pub messages: u64,
    pub bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_frame_is_decoded() {
        let msg = InboundMessage::from_text(r#"{"line":10,"wira":[1,2]}"#);
        assert!(msg.is_json());
        assert_eq!(msg.log_value(), json!({"line": 10, "wira": [1, 2]}));
    }

    #[test]
    fn test_plain_text_falls_back_to_raw() {
        let msg = InboundMessage::from_text("hello dashboard");
        assert_eq!(
            msg,
            InboundMessage::Text {
                raw: String::from("hello dashboard"),
                length: 15
            }
        );
        assert_eq!(msg.log_value(), json!({"raw": "hello dashboard", "length": 15}));
    }

    #[test]
    fn test_raw_length_counts_characters() {
        let msg = InboundMessage::from_text("héllo");
        assert_eq!(
            msg,
            InboundMessage::Text {
                raw: String::from("héllo"),
                length: 5
            }
        );
    }

    #[test]
    fn test_invalid_utf8_binary_is_measured_in_bytes() {
        let (msg, len) = InboundMessage::from_binary(&[0xff, 0xfe, 0x41]);
        assert_eq!(len, 3);
        assert!(!msg.is_json());
    }

    #[test]
    fn test_utf8_binary_follows_text_path() {
        let (msg, len) = InboundMessage::from_binary(br#"{"ok":true}"#);
        assert_eq!(len, 11);
        assert_eq!(msg, InboundMessage::Json(json!({"ok": true})));
    }

    #[test]
    fn test_ping_payload_wire_shape() {
        let payload = PingPayload::new(10, Status::Good);
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["type"], "ping");
        assert_eq!(value["line"], 10);
        assert_eq!(value["status"], "GOOD");
        assert!(value["timestamp"].as_i64().unwrap() > 1_600_000_000_000);
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_close_info_defaults() {
        let info = CloseInfo::new(CLOSE_NORMAL, "");
        assert_eq!(info.reason, None);
        assert_eq!(info.reason_or_default(), "No reason provided");
        assert_eq!(info.meaning(), "Normal Closure");

        assert_eq!(CloseInfo::abnormal().meaning(), "Abnormal Closure");
        assert_eq!(CloseInfo::no_status().code, 1005);
        assert_eq!(close_code_meaning(4000), "Unknown");
    }
}
