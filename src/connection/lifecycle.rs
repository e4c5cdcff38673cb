//! # Connection Lifecycle Manager
//!
//! Drives one WebSocket session at a time through a fixed cycle and starts
//! over after every closure, until the shutdown future resolves.
//!
//! ```text
//!                 ┌──────────────┐  handshake ok  ┌──────┐
//!  start ───────▶│  Connecting  │───────────────▶│ Open │◀─┐ frame / error
//!                 └──────────────┘                └──────┘──┘
//!                        ▲  handshake failed         │ close
//!                        │       ▼                   ▼
//!                        │  ┌──────────────────────────┐
//!                        └──│ Disconnected (3s delay)  │
//!                           └──────────────────────────┘
//! ```
//!
//! Every await point is raced against the shutdown future, so an interrupt
//! is honoured while waiting for the handshake, while connected and during
//! the reconnect delay. Frames are handled one at a time in arrival order.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wira_probe::configuration::SessionConfig;
//! use wira_probe::connection::lifecycle::ConnectionManager;
//! use wira_probe::connection::transport::WsConnector;
//! use wira_probe::error_handling::ProbeError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ProbeError> {
//!     let config = SessionConfig::default();
//!     let connector = WsConnector::new(&config)?;
//!     let mut manager = ConnectionManager::new(config, connector);
//!
//!     let summary = manager
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!     println!("{} messages received", summary.messages);
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior};
use uuid::Uuid;

use crate::configuration::config::SessionConfig;
use crate::error_handling::types::{ProbeError, TransportError};

use super::state::ConnectionState;
use super::transport::{Connector, Link};
use super::types::{CloseInfo, InboundMessage, LifecycleState, PingPayload, RunSummary, TransportEvent};

/// How one connection attempt ended.
#[derive(Debug)]
enum Outcome {
    Closed(CloseInfo),
    Interrupted,
}

pub struct ConnectionManager<C: Connector> {
    config: SessionConfig,
    connector: C,
    lifecycle: LifecycleState,
    connection: ConnectionState,
    summary: RunSummary,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(config: SessionConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            lifecycle: LifecycleState::Disconnected,
            connection: ConnectionState::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Connects, reconnects after every closure, and returns only once
    /// `shutdown` resolves. The returned summary covers the whole run.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<RunSummary, ProbeError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let outcome = self.run_attempt(&mut shutdown).await?;

            let info = match outcome {
                Outcome::Interrupted => break,
                Outcome::Closed(info) => info,
            };
            self.on_close(&info);

            let delay = self.config.reconnect_delay;
            info!("Attempting to reconnect in {} seconds...", delay.as_secs());
            tokio::select! {
                biased;
                _ = shutdown.as_mut() => break,
                _ = sleep(delay) => {}
            }
            info!("Reconnecting...");
        }

        self.lifecycle = LifecycleState::Disconnected;
        info!("Shutting down...");
        log_json("Run summary:", &serde_json::to_value(self.summary)?);
        Ok(self.summary)
    }

    async fn run_attempt<F>(&mut self, shutdown: &mut Pin<&mut F>) -> Result<Outcome, ProbeError>
    where
        F: Future<Output = ()>,
    {
        let attempt = Uuid::new_v4();
        self.connection.reset();
        self.set_lifecycle(LifecycleState::Connecting);
        self.summary.attempts += 1;

        info!("[{}] Connecting to WebSocket: {}", attempt, self.connector.target());
        log_json(
            "Parameters:",
            &serde_json::json!({
                "host": self.config.host,
                "port": self.config.port,
                "line": self.config.line,
                "status": self.config.status,
            }),
        );

        let connected = tokio::select! {
            biased;
            _ = shutdown.as_mut() => return Ok(Outcome::Interrupted),
            res = self.connector.connect() => res,
        };

        let mut link = match connected {
            Ok(link) => link,
            Err(e) => {
                self.on_error(&e);
                return Ok(Outcome::Closed(CloseInfo::abnormal()));
            }
        };

        self.on_open(attempt);

        let ping = sleep(self.config.ping_delay);
        tokio::pin!(ping);
        let mut ping_pending = true;
        let mut keepalive = self.config.keepalive.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                biased;
                _ = shutdown.as_mut() => {
                    self.disconnect(&mut link).await;
                    return Ok(Outcome::Interrupted);
                }
                event = link.next_event() => match event {
                    TransportEvent::Text(text) => {
                        let length = text.chars().count();
                        self.on_message(InboundMessage::from_text(&text), length);
                    }
                    TransportEvent::Binary(payload) => {
                        let (message, length) = InboundMessage::from_binary(&payload);
                        self.on_message(message, length);
                    }
                    TransportEvent::Error(e) => self.on_error(&e),
                    TransportEvent::Closed(info) => return Ok(Outcome::Closed(info)),
                },
                _ = &mut ping, if ping_pending => {
                    ping_pending = false;
                    self.send_ping(&mut link).await?;
                }
                _ = next_tick(&mut keepalive) => {
                    match link.send_keepalive().await {
                        Ok(()) => info!("Sent ping"),
                        Err(e) => self.on_error(&e),
                    }
                }
            }
        }
    }

    fn set_lifecycle(&mut self, next: LifecycleState) {
        debug!("Lifecycle {} -> {}", self.lifecycle, next);
        self.lifecycle = next;
    }

    fn on_open(&mut self, attempt: Uuid) {
        self.connection.mark_open();
        self.set_lifecycle(LifecycleState::Open);
        self.summary.sessions_opened += 1;
        match self.connection.started_at() {
            Some(at) => info!(
                "[{}] WebSocket connection established at {}!",
                attempt,
                at.to_rfc3339()
            ),
            None => info!("[{}] WebSocket connection established!", attempt),
        }
        info!("Ready to receive messages...");
    }

    async fn send_ping<L: Link>(&mut self, link: &mut L) -> Result<(), ProbeError> {
        if !self.connection.is_open() {
            return Ok(());
        }

        let payload = PingPayload::new(self.config.line, self.config.status);
        log_json("Sending test message:", &serde_json::to_value(&payload)?);

        if let Err(e) = link.send_text(serde_json::to_string(&payload)?).await {
            self.on_error(&e);
        }
        Ok(())
    }

    fn on_message(&mut self, message: InboundMessage, length: usize) {
        let title = if message.is_json() {
            "Received JSON message:"
        } else {
            "Received text message:"
        };
        log_json(title, &message.log_value());

        self.connection.record_frame(length);
        self.summary.messages += 1;
        self.summary.bytes += length as u64;

        info!(
            "Total messages: {}, Bytes: {}",
            self.connection.messages(),
            self.connection.bytes()
        );
    }

    fn on_error(&self, err: &TransportError) {
        error!(
            "WebSocket error occurred:\n{}",
            pretty(&serde_json::json!({
                "message": err.to_string(),
                "type": err.kind(),
            }))
        );
    }

    fn on_close(&mut self, info: &CloseInfo) {
        let duration = self.connection.mark_closed();
        self.set_lifecycle(LifecycleState::Disconnected);

        warn!(
            "WebSocket connection closed:\n{}",
            pretty(&serde_json::json!({
                "code": info.code,
                "codeMeaning": info.meaning(),
                "reason": info.reason_or_default(),
                "duration": format_duration(duration),
            }))
        );
    }

    async fn disconnect<L: Link>(&mut self, link: &mut L) {
        if let Err(e) = link.close().await {
            debug!("Close handshake did not complete: {}", e);
        }
        self.connection.mark_closed();
        info!("WebSocket connection closed by user");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2} seconds", duration.as_secs_f64())
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn log_json(title: &str, value: &Value) {
    info!("{}\n{}", title, pretty(value));
}
