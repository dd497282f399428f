//! Short-term hits repository — append-only trade outcomes with time-based expiry

use crate::{from_millis, to_millis, DbResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// A single completed trade evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub gain_pct: f64,
}

#[derive(Debug, FromRow)]
struct HitRow {
    symbol: String,
    ts: i64,
    gain_pct: f64,
}

/// Repository for the `engine_short_hits` collection
pub struct HitRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> HitRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an outcome stamped with `at`
    pub async fn insert(&self, symbol: &str, gain_pct: f64, at: DateTime<Utc>) -> DbResult<i64> {
        let result =
            sqlx::query("INSERT INTO engine_short_hits (symbol, ts, gain_pct) VALUES (?1, ?2, ?3)")
                .bind(symbol)
                .bind(to_millis(at))
                .bind(gain_pct)
                .execute(self.pool)
                .await?;

        Ok(result.last_insert_rowid())
    }

    /// Gains recorded for `symbol` at or after `since`
    pub async fn gains_since(&self, symbol: &str, since: DateTime<Utc>) -> DbResult<Vec<f64>> {
        let rows: Vec<(f64,)> = sqlx::query_as(
            "SELECT gain_pct FROM engine_short_hits WHERE symbol = ?1 AND ts >= ?2 ORDER BY ts ASC",
        )
        .bind(symbol)
        .bind(to_millis(since))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(g,)| g).collect())
    }

    /// Full records for `symbol` at or after `since`, newest first
    pub async fn records_since(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> DbResult<Vec<HitRecord>> {
        let rows = sqlx::query_as::<_, HitRow>(
            r#"SELECT symbol, ts, gain_pct FROM engine_short_hits
               WHERE symbol = ?1 AND ts >= ?2
               ORDER BY ts DESC"#,
        )
        .bind(symbol)
        .bind(to_millis(since))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| -> DbResult<HitRecord> {
                Ok(HitRecord {
                    symbol: r.symbol,
                    timestamp: from_millis(r.ts)?,
                    gain_pct: r.gain_pct,
                })
            })
            .collect()
    }

    /// Delete every record older than `cutoff` (uses the ts index)
    /// Returns the number of deleted rows.
    pub async fn delete_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM engine_short_hits WHERE ts < ?1")
            .bind(to_millis(cutoff))
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Total stored records, expired or not
    pub async fn count(&self) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM engine_short_hits")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
