//! WebSocket connection lifecycle.
//!
//! - `types`: lifecycle states, inbound/outbound payloads, close information
//! - `state`: per-connection counters and timing
//! - `transport`: the `Connector`/`Link` seam and its tokio-tungstenite implementation
//! - `lifecycle`: the reconnecting `ConnectionManager`

pub mod lifecycle;
pub mod state;
pub mod transport;
pub mod types;

pub use lifecycle::ConnectionManager;
pub use state::ConnectionState;
pub use transport::{Connector, Link, WsConnector, WsLink};
pub use types::{CloseInfo, InboundMessage, LifecycleState, PingPayload, RunSummary, TransportEvent};
