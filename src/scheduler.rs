// src/scheduler.rs

//! Periodic execution with an overlap guard.
//!
//! Timer ticks and manual triggers share one [`RelayRunner`], so a run never
//! starts while another is still in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::models::RunReport;
use crate::pipeline::Relay;

/// Shared handle that serializes relay runs.
pub struct RelayRunner {
    relay: Relay,
    running: Mutex<()>,
}

impl RelayRunner {
    pub fn new(relay: Relay) -> Self {
        Self {
            relay,
            running: Mutex::new(()),
        }
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    /// Run one tick unless another is in progress.
    ///
    /// Returns `None` when a run is already active.
    pub async fn try_run(&self) -> Option<Result<RunReport>> {
        let _guard = self.running.try_lock().ok()?;
        Some(self.relay.run().await)
    }

    /// Start the interval loop. The first tick fires immediately.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                timer.tick().await;

                match self.try_run().await {
                    Some(Ok(report)) => log_report(&report),
                    Some(Err(e)) => log::error!("Relay run failed: {}", e),
                    None => log::warn!("Previous run still in progress, skipping tick"),
                }
            }
        })
    }
}

fn log_report(report: &RunReport) {
    match report {
        RunReport::Skipped { reason } => log::info!("Run skipped: {}", reason),
        RunReport::Completed {
            deliveries,
            seen_total,
        } => log::info!(
            "Run complete: {} deliveries, {} keys processed",
            deliveries.len(),
            seen_total
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Config, StorageBackend};
    use crate::storage::MemoryStorage;

    fn unreachable_runner() -> RelayRunner {
        let mut config = Config::default();
        config.relay.service_url = "http://127.0.0.1:1".to_string();
        config.relay.status_page_url = "http://127.0.0.1:1".to_string();
        config.storage.backend = StorageBackend::Memory;

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let relay = Relay::new(Arc::new(config), client, Arc::new(MemoryStorage::new())).unwrap();
        RelayRunner::new(relay)
    }

    #[tokio::test]
    async fn test_try_run_reports_skip() {
        let runner = unreachable_runner();
        let report = runner.try_run().await.unwrap().unwrap();
        assert!(matches!(report, RunReport::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_overlapping_run_is_refused() {
        let runner = unreachable_runner();
        let _held = runner.running.try_lock().unwrap();
        assert!(runner.try_run().await.is_none());
    }
}
