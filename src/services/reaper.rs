//! Periodic eviction of completed jobs from the in-memory registry.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::services::registry::JobRegistry;

/// Apply the registry's retention policy every `interval` until `cancel` fires.
pub async fn run(registry: Arc<JobRegistry>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Job reaper started");

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job reaper stopping");
                break;
            }
            _ = ticker.tick() => {
                let removed = registry.reap(Utc::now()).await;
                if removed > 0 {
                    tracing::info!(removed, "Evicted completed jobs");
                } else {
                    tracing::debug!("No jobs to evict");
                }
            }
        }
    }
}
