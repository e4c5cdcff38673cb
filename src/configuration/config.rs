use super::types::*;
use clap::Parser;
use std::ffi::OsString;
use std::time::Duration;

/// Command-line surface of the probe.
///
/// Every flag can also be supplied through its environment variable, the
/// command line wins when both are present. `--status` is validated by
/// `clap` before any connection is attempted.
#[derive(Parser, Debug, Clone)]
#[command(name = "wira-probe")]
#[command(version)]
#[command(about = "WebSocket test client for the Wira dashboard API")]
#[command(after_help = "Examples:
  wira-probe
  wira-probe --host 10.5.0.106 --port 7000 --line 10 --status GOOD
  wira-probe --host 192.168.1.100 --port 8080 --line 5 --status REWORK")]
pub struct Args {
    /// Host name or IP address of the dashboard server
    #[arg(long, env = "WIRA_WS_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// TCP port of the dashboard server
    #[arg(long, env = "WIRA_WS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Production line number sent in the ping payload
    #[arg(long, env = "WIRA_WS_LINE", default_value_t = DEFAULT_LINE, allow_negative_numbers = true)]
    pub line: i64,

    /// Status sent in the ping payload
    #[arg(long, env = "WIRA_WS_STATUS", value_enum, default_value_t = Status::Good)]
    pub status: Status,

    /// Interval between keep-alive Ping frames while connected, 0 disables them
    #[arg(long, env = "WIRA_WS_KEEPALIVE_SECS", default_value_t = DEFAULT_KEEPALIVE_SECS)]
    pub keepalive_secs: u64,
}

impl Args {
    pub fn from_args() -> Self {
        Args::parse()
    }

    pub fn try_from_iter<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Args::try_parse_from(args)
    }
}

/// Immutable description of the session the probe keeps re-establishing.
///
/// Built once at startup and handed to the
/// [`ConnectionManager`](crate::connection::lifecycle::ConnectionManager),
/// which only ever reads it. The `line` and `status` sent in every ping come
/// from here, so they stay identical across reconnects.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub line: i64,
    pub status: Status,
    pub user_agent: String,
    pub ping_delay: Duration,
    pub reconnect_delay: Duration,
    pub keepalive: Option<Duration>,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, port: u16, line: i64, status: Status) -> Self {
        Self {
            host: host.into(),
            port,
            path: String::from(DASHBOARD_PATH),
            line,
            status,
            user_agent: String::from(USER_AGENT),
            ping_delay: Duration::from_secs(PING_DELAY_SECS),
            reconnect_delay: Duration::from_secs(RECONNECT_DELAY_SECS),
            keepalive: Some(Duration::from_secs(DEFAULT_KEEPALIVE_SECS)),
        }
    }

    pub fn with_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn target_url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig::new(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_LINE, Status::Good)
    }
}

impl From<Args> for SessionConfig {
    fn from(args: Args) -> Self {
        let keepalive = match args.keepalive_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        SessionConfig::new(args.host, args.port, args.line, args.status).with_keepalive(keepalive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        let args = Args::try_from_iter(["wira-probe"]).unwrap_or_else(|e| panic!("{}", e));
        let config = SessionConfig::from(args);

        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.target_url(), "ws://10.5.0.106:7000/ws/wira-dashboard");
        assert_eq!(config.ping_delay, Duration::from_secs(1));
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
    }

    #[test]
    #[serial]
    fn test_from_args() {
        let args = Args::try_from_iter([
            "wira-probe",
            "--host",
            "192.168.1.100",
            "--port",
            "8080",
            "--line",
            "5",
            "--status",
            "REWORK",
            "--keepalive-secs",
            "0",
        ])
        .unwrap_or_else(|e| panic!("{}", e));
        let config = SessionConfig::from(args);

        assert_eq!(config.host, "192.168.1.100");
        assert_eq!(config.port, 8080);
        assert_eq!(config.line, 5);
        assert_eq!(config.status, Status::Rework);
        assert_eq!(config.keepalive, None);
        assert_eq!(config.target_url(), "ws://192.168.1.100:8080/ws/wira-dashboard");
    }

    #[test]
    #[serial]
    fn test_target_url_is_plain_concatenation() {
        for (host, port) in [("localhost", 1u16), ("10.0.0.1", 65535), ("dash.local", 7000)] {
            let config = SessionConfig::new(host, port, 1, Status::Wira);
            assert_eq!(
                config.target_url(),
                format!("ws://{}:{}{}", host, port, DASHBOARD_PATH)
            );
        }
    }

    #[test]
    #[serial]
    fn test_status_rejects_unknown_value() {
        let err = Args::try_from_iter(["wira-probe", "--status", "BROKEN"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);

        // Names are case-sensitive, matching the dashboard's vocabulary.
        assert!(Args::try_from_iter(["wira-probe", "--status", "good"]).is_err());
    }

    #[test]
    #[serial]
    fn test_port_out_of_range_is_rejected() {
        assert!(Args::try_from_iter(["wira-probe", "--port", "70000"]).is_err());
    }

    #[test]
    #[serial]
    fn test_environment_overrides_defaults() {
        std::env::set_var("WIRA_WS_HOST", "127.0.0.1");
        std::env::set_var("WIRA_WS_STATUS", "REJECT");

        let parsed = Args::try_from_iter(["wira-probe", "--line", "-3"]);

        std::env::remove_var("WIRA_WS_HOST");
        std::env::remove_var("WIRA_WS_STATUS");

        let config = SessionConfig::from(parsed.unwrap_or_else(|e| panic!("{}", e)));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.status, Status::Reject);
        assert_eq!(config.line, -3);
    }
}
