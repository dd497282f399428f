//! Per-symbol hit-rate summaries

use crate::{from_millis, to_millis, DbError, DbResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Derived hit-rate aggregate for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub symbol: String,
    pub hit_rate_7d: f64,
    pub hit_rate_30d: f64,
    pub total_signals: i64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct MetricsRow {
    symbol: String,
    hit_rate_7d: f64,
    hit_rate_30d: f64,
    total_signals: i64,
    last_updated: i64,
}

impl TryFrom<MetricsRow> for MetricsSummary {
    type Error = DbError;

    fn try_from(row: MetricsRow) -> DbResult<Self> {
        Ok(Self {
            symbol: row.symbol,
            hit_rate_7d: row.hit_rate_7d,
            hit_rate_30d: row.hit_rate_30d,
            total_signals: row.total_signals,
            last_updated: from_millis(row.last_updated)?,
        })
    }
}

/// Repository for the `engine_metrics` collection
pub struct MetricsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MetricsRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Overwrite every field of the summary for its symbol (upsert by symbol)
    pub async fn upsert(&self, summary: &MetricsSummary) -> DbResult<()> {
        sqlx::query(
            r#"INSERT INTO engine_metrics
                (symbol, hit_rate_7d, hit_rate_30d, total_signals, last_updated)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(symbol) DO UPDATE SET
                 hit_rate_7d = excluded.hit_rate_7d,
                 hit_rate_30d = excluded.hit_rate_30d,
                 total_signals = excluded.total_signals,
                 last_updated = excluded.last_updated
            "#,
        )
        .bind(&summary.symbol)
        .bind(summary.hit_rate_7d)
        .bind(summary.hit_rate_30d)
        .bind(summary.total_signals)
        .bind(to_millis(summary.last_updated))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, symbol: &str) -> DbResult<Option<MetricsSummary>> {
        let row = sqlx::query_as::<_, MetricsRow>(
            r#"SELECT symbol, hit_rate_7d, hit_rate_30d, total_signals, last_updated
               FROM engine_metrics WHERE symbol = ?1"#,
        )
        .bind(symbol)
        .fetch_optional(self.pool)
        .await?;

        row.map(MetricsSummary::try_from).transpose()
    }
}
