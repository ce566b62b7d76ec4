//! Background service that drops idle sessions.
//!
//! Sessions live only in memory; one left behind by a closed browser tab
//! would otherwise hold its image and cutout until the process exits.

use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info};
use wardrobe_flow::SessionRegistry;

use crate::metrics;

/// Idle session reaper.
pub struct SessionReaper {
    sessions: SessionRegistry,
    ttl: Duration,
    every: Duration,
}

impl SessionReaper {
    pub fn new(sessions: SessionRegistry, ttl: Duration, every: Duration) -> Self {
        Self {
            sessions,
            ttl,
            every,
        }
    }

    /// Start the reaping loop.
    ///
    /// This function runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        info!(
            "Starting session reaper (ttl: {:?}, interval: {:?})",
            self.ttl, self.every
        );

        let mut ticker = interval(self.every);
        loop {
            ticker.tick().await;
            self.reap_once().await;
        }
    }

    /// Run a single pass. Returns how many sessions were dropped.
    pub async fn reap_once(&self) -> usize {
        let reaped = self.sessions.reap_idle(self.ttl).await;
        if reaped > 0 {
            let remaining = self.sessions.len().await;
            info!(reaped, remaining, "Reaped idle sessions");
            metrics::record_sessions_reaped(reaped);
        } else {
            debug!("No idle sessions to reap");
        }
        reaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reap_once_drops_idle_sessions() {
        let sessions = SessionRegistry::default();
        sessions.create().await;
        sessions.create().await;

        let keep = SessionReaper::new(sessions.clone(), Duration::from_secs(3600), Duration::from_secs(60));
        assert_eq!(keep.reap_once().await, 0);
        assert_eq!(sessions.len().await, 2);

        // A zero TTL treats every session as idle
        let drop_all = SessionReaper::new(sessions.clone(), Duration::ZERO, Duration::from_secs(60));
        assert_eq!(drop_all.reap_once().await, 2);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_reaps_from_spawned_task() {
        let sessions = SessionRegistry::default();
        sessions.create().await;

        let reaper = SessionReaper::new(sessions.clone(), Duration::ZERO, Duration::from_millis(10));
        let handle = tokio::spawn(async move { reaper.run().await });

        for _ in 0..100 {
            if sessions.is_empty().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(sessions.is_empty().await);
        handle.abort();
    }
}
