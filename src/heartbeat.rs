//! Periodic liveness logging.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// How often the liveness line is written.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Writes a liveness line to the log at a fixed interval. The line proves
/// the process is not wedged between commands, nothing more.
pub struct Heartbeat {
    handle: JoinHandle<()>,
    beats: Arc<AtomicU64>,
}

impl Heartbeat {
    /// Starts the ticker with the production interval.
    pub fn start() -> Self {
        Self::with_interval(HEARTBEAT_INTERVAL)
    }

    fn with_interval(period: Duration) -> Self {
        let beats = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&beats);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // An interval's first tick fires immediately; skip it so the
            // first beat lands one full period in.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let beat = counter.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::info!(beat, "Profilebot is alive");
            }
        });

        tracing::debug!(period_secs = period.as_secs(), "Heartbeat started");
        Self { handle, beats }
    }

    /// Beats logged so far.
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }

    /// Stops the ticker.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_heartbeat_ticks_at_the_configured_interval() {
        let heartbeat = Heartbeat::with_interval(Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(heartbeat.beats() >= 2, "saw {} beats", heartbeat.beats());
        heartbeat.stop();
    }

    #[tokio::test]
    async fn test_stop_ends_the_ticking() {
        let heartbeat = Heartbeat::with_interval(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;

        heartbeat.stop();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let seen = heartbeat.beats();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(heartbeat.beats(), seen);
    }
}
