//! Retention sweeper — removes trade outcomes past the 30-day window
//!
//! SQLite has no document TTL, so expiry is an explicit periodic delete that
//! runs in its own task, off the scan cadence.

use crate::pacing::sleep_unless_cancelled;
use persistence::MetricsStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Sweep now, then every `interval`, until `cancelled` is set.
/// Returns the total number of purged records.
pub async fn run_retention_sweeper(
    store: MetricsStore,
    interval: Duration,
    cancelled: Arc<AtomicBool>,
) -> u64 {
    info!(interval_secs = interval.as_secs(), "Retention sweeper starting");
    let mut purged_total = 0u64;

    loop {
        if cancelled.load(Ordering::Relaxed) {
            break;
        }

        match store.purge_expired().await {
            Ok(purged) => purged_total += purged,
            Err(e) => warn!(error = %e, "Retention sweep failed, retrying next tick"),
        }

        if !sleep_unless_cancelled(interval, &cancelled).await {
            break;
        }
    }

    info!(purged_total, "Retention sweeper stopped");
    purged_total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use persistence::Database;

    #[tokio::test]
    async fn test_sweeper_purges_on_first_pass() {
        let db = Database::in_memory().await.unwrap();
        let store = MetricsStore::new(db.pool_clone());
        let now = Utc::now();

        store
            .log_outcome_at("ETHUSDT", 1.0, now - ChronoDuration::days(45))
            .await
            .unwrap();
        store
            .log_outcome_at("ETHUSDT", 1.0, now - ChronoDuration::days(3))
            .await
            .unwrap();

        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(run_retention_sweeper(
            store.clone(),
            Duration::from_secs(3600),
            cancelled.clone(),
        ));

        // Give the first pass a moment, then stop the task
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancelled.store(true, Ordering::Relaxed);

        let purged = handle.await.unwrap();
        assert_eq!(purged, 1);
        assert_eq!(store.stored_outcomes().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_sweeper_does_nothing() {
        let db = Database::in_memory().await.unwrap();
        let store = MetricsStore::new(db.pool_clone());

        let purged = run_retention_sweeper(
            store,
            Duration::from_secs(1),
            Arc::new(AtomicBool::new(true)),
        )
        .await;
        assert_eq!(purged, 0);
    }
}
