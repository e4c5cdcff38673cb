pub mod configuration;
pub use configuration::{SessionConfig, Status};

pub mod connection;
pub use connection::ConnectionManager;

pub mod error_handling;
pub use error_handling::{ProbeError, TransportError};
