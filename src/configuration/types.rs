use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "10.5.0.106";
pub const DEFAULT_PORT: u16 = 7000;
pub const DASHBOARD_PATH: &str = "/ws/wira-dashboard";
pub const DEFAULT_LINE: i64 = 10;
pub const DEFAULT_KEEPALIVE_SECS: u64 = 30;
pub const USER_AGENT: &str = "WebSocket-Test-Client/1.0";

/// Delay between a successful handshake and the diagnostic ping.
pub const PING_DELAY_SECS: u64 = 1;
/// Fixed wait before every reconnect attempt. Never grows.
pub const RECONNECT_DELAY_SECS: u64 = 3;

/// Inspection outcome reported alongside the line number in the ping payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    #[value(name = "GOOD")]
    Good,
    #[value(name = "REWORK")]
    Rework,
    #[value(name = "REJECT")]
    Reject,
    #[value(name = "WIRA")]
    Wira,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Good => "GOOD",
            Status::Rework => "REWORK",
            Status::Reject => "REJECT",
            Status::Wira => "WIRA",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
