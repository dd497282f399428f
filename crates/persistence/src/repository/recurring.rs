//! Recurring rockets: streak bookkeeping for top-N selections

use crate::{from_millis, to_millis, DbError, DbResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Stored row, including the internal id
#[derive(Debug, Clone, FromRow)]
struct RecurringRow {
    #[allow(dead_code)]
    id: i64,
    symbol: String,
    streak_count: i64,
    last_seen: i64,
}

/// A symbol that has appeared in at least one top-N selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringEntry {
    pub symbol: String,
    pub streak_count: i64,
    pub last_seen: DateTime<Utc>,
}

impl TryFrom<RecurringRow> for RecurringEntry {
    type Error = DbError;

    fn try_from(row: RecurringRow) -> DbResult<Self> {
        Ok(Self {
            symbol: row.symbol,
            streak_count: row.streak_count,
            last_seen: from_millis(row.last_seen)?,
        })
    }
}

/// Repository for the `recurring_rockets` collection
pub struct RecurringRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RecurringRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert with streak 1, or bump the streak and refresh last_seen (upsert by symbol)
    pub async fn upsert_seen(&self, symbol: &str, at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"INSERT INTO recurring_rockets (symbol, streak_count, last_seen)
               VALUES (?1, 1, ?2)
               ON CONFLICT(symbol) DO UPDATE SET
                 streak_count = streak_count + 1,
                 last_seen = excluded.last_seen
            "#,
        )
        .bind(symbol)
        .bind(to_millis(at))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get a single entry by symbol
    pub async fn get(&self, symbol: &str) -> DbResult<Option<RecurringEntry>> {
        let row = sqlx::query_as::<_, RecurringRow>(
            "SELECT id, symbol, streak_count, last_seen FROM recurring_rockets WHERE symbol = ?1",
        )
        .bind(symbol)
        .fetch_optional(self.pool)
        .await?;

        row.map(RecurringEntry::try_from).transpose()
    }

    /// Entries ordered by streak descending, ties by symbol ascending
    pub async fn top_by_streak(&self, limit: usize) -> DbResult<Vec<RecurringEntry>> {
        let limit = i64::try_from(limit)
            .map_err(|_| DbError::Query(format!("limit out of range: {limit}")))?;

        let rows = sqlx::query_as::<_, RecurringRow>(
            r#"SELECT id, symbol, streak_count, last_seen
               FROM recurring_rockets
               ORDER BY streak_count DESC, symbol ASC
               LIMIT ?1"#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(RecurringEntry::try_from).collect()
    }
}
