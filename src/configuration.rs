pub mod config;
pub mod types;

pub use config::{Args, SessionConfig};
pub use types::Status;
