pub mod types;

pub use types::{ProbeError, TransportError};
