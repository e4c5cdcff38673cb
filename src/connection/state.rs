use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Mutable record of the connection currently being driven.
///
/// Counters only cover the current connection: [`reset`](Self::reset) runs
/// at the start of every attempt. Lifetime totals live in
/// [`RunSummary`](super::types::RunSummary).
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    open: bool,
    started_at: Option<DateTime<Utc>>,
    started: Option<Instant>,
    messages: u64,
    bytes: u64,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn mark_open(&mut self) {
        self.open = true;
        self.started_at = Some(Utc::now());
        self.started = Some(Instant::now());
    }

    /// Marks the connection closed and returns how long it was open, zero
    /// if it never opened.
    pub fn mark_closed(&mut self) -> Duration {
        self.open = false;
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    pub fn record_frame(&mut self, length: usize) {
        self.messages += 1;
        self.bytes += length as u64;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn messages(&self) -> u64 {
        self.messages
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_frame_counts() {
        let mut state = ConnectionState::new();
        state.record_frame(12);
        state.record_frame(0);
        state.record_frame(5);

        assert_eq!(state.messages(), 3);
        assert_eq!(state.bytes(), 17);
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut state = ConnectionState::new();
        state.mark_open();
        state.record_frame(8);
        state.reset();

        assert!(!state.is_open());
        assert!(state.started_at().is_none());
        assert_eq!(state.messages(), 0);
        assert_eq!(state.bytes(), 0);
    }

    #[test]
    fn test_duration_is_zero_when_never_opened() {
        let mut state = ConnectionState::new();
        assert_eq!(state.mark_closed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_measures_open_time() {
        let mut state = ConnectionState::new();
        state.mark_open();
        assert!(state.is_open());

        tokio::time::advance(Duration::from_millis(2500)).await;

        assert_eq!(state.mark_closed(), Duration::from_millis(2500));
        assert!(!state.is_open());
    }
}
