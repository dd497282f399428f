//! Metrics store — the write path of the scan loop and the trade evaluator
//!
//! `MetricsStore` is the explicit store handle constructed at startup and
//! handed to every consumer. It owns a clone of the pool, so it is cheap to
//! clone into spawned tasks.
//!
//! Every operation has an `*_at` variant taking the current time explicitly;
//! the plain variants read the wall clock.

use crate::repository::{
    HitRecord, HitRepository, MetricsRepository, MetricsSummary, RecurringEntry,
    RecurringRepository,
};
use crate::{DbResult, SqlitePool};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// Trailing window of the short hit rate
pub const SHORT_WINDOW_DAYS: i64 = 7;
/// Trailing window of the long hit rate, also the hit retention period
pub const RETENTION_DAYS: i64 = 30;
/// Default number of entries returned by `load_top_recurring`
pub const DEFAULT_RECURRING_LIMIT: usize = 20;

/// Sink for top-N selections made by the scan loop
#[async_trait]
pub trait SelectionStore: Send + Sync {
    async fn record_selection(&self, symbol: &str) -> DbResult<()>;
}

/// Handle over the three rocket collections
#[derive(Clone)]
pub struct MetricsStore {
    pool: SqlitePool,
}

impl MetricsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert the recurring entry for `symbol` as seen at `now`
    pub async fn record_selection_at(&self, symbol: &str, now: DateTime<Utc>) -> DbResult<()> {
        RecurringRepository::new(&self.pool)
            .upsert_seen(symbol, now)
            .await?;
        debug!(symbol, "Recorded selection");
        Ok(())
    }

    /// Append a trade outcome stamped with the current time
    pub async fn log_outcome(&self, symbol: &str, gain_pct: f64) -> DbResult<()> {
        self.log_outcome_at(symbol, gain_pct, Utc::now()).await
    }

    pub async fn log_outcome_at(
        &self,
        symbol: &str,
        gain_pct: f64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        HitRepository::new(&self.pool)
            .insert(symbol, gain_pct, now)
            .await?;
        debug!(symbol, gain_pct, "Logged outcome");
        Ok(())
    }

    /// Recompute and overwrite the hit-rate summary of `symbol`
    pub async fn recompute_metrics(&self, symbol: &str) -> DbResult<MetricsSummary> {
        self.recompute_metrics_at(symbol, Utc::now()).await
    }

    pub async fn recompute_metrics_at(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> DbResult<MetricsSummary> {
        let hits = HitRepository::new(&self.pool);
        let last_7d = hits
            .gains_since(symbol, now - Duration::days(SHORT_WINDOW_DAYS))
            .await?;
        let last_30d = hits
            .gains_since(symbol, now - Duration::days(RETENTION_DAYS))
            .await?;

        let summary = MetricsSummary {
            symbol: symbol.to_string(),
            hit_rate_7d: hit_rate(&last_7d),
            hit_rate_30d: hit_rate(&last_30d),
            total_signals: last_30d.len() as i64,
            last_updated: now,
        };

        MetricsRepository::new(&self.pool).upsert(&summary).await?;
        debug!(
            symbol,
            hit_rate_7d = summary.hit_rate_7d,
            hit_rate_30d = summary.hit_rate_30d,
            total_signals = summary.total_signals,
            "Metrics recomputed"
        );
        Ok(summary)
    }

    /// Log an outcome and refresh the summary it feeds into
    pub async fn log_outcome_and_refresh(
        &self,
        symbol: &str,
        gain_pct: f64,
    ) -> DbResult<MetricsSummary> {
        let now = Utc::now();
        self.log_outcome_at(symbol, gain_pct, now).await?;
        self.recompute_metrics_at(symbol, now).await
    }

    /// Top recurring rockets by streak (ties by symbol ascending)
    pub async fn load_top_recurring(&self, limit: usize) -> DbResult<Vec<RecurringEntry>> {
        RecurringRepository::new(&self.pool)
            .top_by_streak(limit)
            .await
    }

    pub async fn load_summary(&self, symbol: &str) -> DbResult<Option<MetricsSummary>> {
        MetricsRepository::new(&self.pool).get(symbol).await
    }

    /// Outcomes still inside the retention window, newest first
    pub async fn recent_outcomes(&self, symbol: &str) -> DbResult<Vec<HitRecord>> {
        HitRepository::new(&self.pool)
            .records_since(symbol, Utc::now() - Duration::days(RETENTION_DAYS))
            .await
    }

    /// Physically remove outcomes past the retention window
    pub async fn purge_expired(&self) -> DbResult<u64> {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let deleted = HitRepository::new(&self.pool)
            .delete_before(now - Duration::days(RETENTION_DAYS))
            .await?;
        if deleted > 0 {
            info!(deleted, "Purged expired hits");
        }
        Ok(deleted)
    }

    /// Number of stored outcomes, including any not yet swept
    pub async fn stored_outcomes(&self) -> DbResult<i64> {
        HitRepository::new(&self.pool).count().await
    }
}

#[async_trait]
impl SelectionStore for MetricsStore {
    async fn record_selection(&self, symbol: &str) -> DbResult<()> {
        self.record_selection_at(symbol, Utc::now()).await
    }
}

/// Percentage of positive gains, rounded to 2 dp; 0 for an empty window
fn hit_rate(gains: &[f64]) -> f64 {
    if gains.is_empty() {
        return 0.0;
    }
    let hits = gains.iter().filter(|g| **g > 0.0).count();
    round2(hits as f64 / gains.len() as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn store() -> MetricsStore {
        let db = Database::in_memory().await.unwrap();
        MetricsStore::new(db.pool_clone())
    }

    #[test]
    fn test_hit_rate_rounding() {
        assert_eq!(hit_rate(&[]), 0.0);
        assert_eq!(hit_rate(&[1.0, -1.0, 0.0]), 33.33);
        assert_eq!(hit_rate(&[1.0, 2.0, -1.0]), 66.67);
        // Zero gain is not a hit
        assert_eq!(hit_rate(&[0.0]), 0.0);
        // Exact halves go to the even digit: 1/32 = 3.125%
        let mut gains = vec![-1.0; 31];
        gains.push(1.0);
        assert_eq!(hit_rate(&gains), 3.12);
        // 3/32 = 9.375%
        gains[0] = 1.0;
        gains[1] = 1.0;
        assert_eq!(hit_rate(&gains), 9.38);
    }

    #[tokio::test]
    async fn test_recompute_without_hits_is_all_zero() {
        let store = store().await;
        let now = Utc::now();

        let summary = store.recompute_metrics_at("GME", now).await.unwrap();
        assert_eq!(summary.hit_rate_7d, 0.0);
        assert_eq!(summary.hit_rate_30d, 0.0);
        assert_eq!(summary.total_signals, 0);

        let stored = store.load_summary("GME").await.unwrap().unwrap();
        assert_eq!(stored.total_signals, 0);
        assert_eq!(stored.last_updated.timestamp_millis(), now.timestamp_millis());
    }

    #[tokio::test]
    async fn test_recompute_windows_relative_to_now() {
        let store = store().await;
        let now = Utc::now();

        for age in [1, 6, 10, 29, 31] {
            store
                .log_outcome_at("SMCI", 1.0, now - Duration::days(age))
                .await
                .unwrap();
        }

        let summary = store.recompute_metrics_at("SMCI", now).await.unwrap();
        assert_eq!(summary.hit_rate_7d, 100.0);
        assert_eq!(summary.hit_rate_30d, 100.0);
        assert_eq!(summary.total_signals, 4);

        let hits = HitRepository::new(&store.pool);
        let last_7d = hits
            .gains_since("SMCI", now - Duration::days(SHORT_WINDOW_DAYS))
            .await
            .unwrap();
        assert_eq!(last_7d.len(), 2);
    }

    #[tokio::test]
    async fn test_recompute_mixed_outcomes() {
        let store = store().await;
        let now = Utc::now();

        for (age, gain) in [(1, 3.2), (2, -0.4), (12, 0.0), (20, 1.1)] {
            store
                .log_outcome_at("MARA", gain, now - Duration::days(age))
                .await
                .unwrap();
        }

        let summary = store.recompute_metrics_at("MARA", now).await.unwrap();
        assert_eq!(summary.hit_rate_30d, 50.0);
        assert_eq!(summary.hit_rate_7d, 50.0);
        assert_eq!(summary.total_signals, 4);
    }

    #[tokio::test]
    async fn test_recompute_rounds_halves_to_even() {
        let store = store().await;
        let now = Utc::now();
        let at = now - Duration::days(1);

        store.log_outcome_at("RIOT", 1.0, at).await.unwrap();
        for _ in 0..31 {
            store.log_outcome_at("RIOT", -1.0, at).await.unwrap();
        }

        let summary = store.recompute_metrics_at("RIOT", now).await.unwrap();
        assert_eq!(summary.hit_rate_30d, 3.12);
        assert_eq!(summary.hit_rate_7d, 3.12);
        assert_eq!(summary.total_signals, 32);
    }

    #[tokio::test]
    async fn test_summary_survives_until_recomputed() {
        let store = store().await;
        let now = Utc::now();

        store
            .log_outcome_at("UPST", 5.0, now - Duration::days(29))
            .await
            .unwrap();
        store.recompute_metrics_at("UPST", now).await.unwrap();

        // Outcome ages out and gets swept; the stale summary stays until the next recompute
        let later = now + Duration::days(2);
        assert_eq!(store.purge_expired_at(later).await.unwrap(), 1);
        assert_eq!(
            store.load_summary("UPST").await.unwrap().unwrap().total_signals,
            1
        );

        let refreshed = store.recompute_metrics_at("UPST", later).await.unwrap();
        assert_eq!(refreshed.total_signals, 0);
        assert_eq!(refreshed.hit_rate_30d, 0.0);
    }

    #[tokio::test]
    async fn test_record_selection_accumulates_streak() {
        let store = store().await;
        let start = Utc::now();
        let calls = [
            start,
            start + Duration::minutes(1),
            start + Duration::minutes(2),
        ];

        for at in calls {
            store.record_selection_at("ABC", at).await.unwrap();
        }

        let top = store.load_top_recurring(DEFAULT_RECURRING_LIMIT).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].streak_count, 3);
        assert_eq!(
            top[0].last_seen.timestamp_millis(),
            calls[2].timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_selection_store_trait_uses_wall_clock() {
        let store = store().await;
        let before = Utc::now();

        let sink: &dyn SelectionStore = &store;
        sink.record_selection("XYZ").await.unwrap();

        let entry = store.load_top_recurring(1).await.unwrap().remove(0);
        assert_eq!(entry.symbol, "XYZ");
        assert!(entry.last_seen.timestamp_millis() >= before.timestamp_millis());
    }

    #[tokio::test]
    async fn test_expired_hit_is_excluded_then_purged() {
        let store = store().await;
        let now = Utc::now();

        store
            .log_outcome_at("IONQ", 8.0, now - Duration::days(31))
            .await
            .unwrap();

        let summary = store.recompute_metrics_at("IONQ", now).await.unwrap();
        assert_eq!(summary.total_signals, 0);
        assert_eq!(store.stored_outcomes().await.unwrap(), 1);

        assert_eq!(store.purge_expired_at(now).await.unwrap(), 1);
        assert_eq!(store.stored_outcomes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_log_outcome_and_refresh() {
        let store = store().await;

        store.log_outcome_and_refresh("RKLB", 2.0).await.unwrap();
        let summary = store.log_outcome_and_refresh("RKLB", -2.0).await.unwrap();

        assert_eq!(summary.total_signals, 2);
        assert_eq!(summary.hit_rate_7d, 50.0);
        assert_eq!(store.recent_outcomes("RKLB").await.unwrap().len(), 2);
    }
}
