//! Database schema definitions

/// SQL to create all collections
/// NOTE: All timestamps stored as INTEGER unix milliseconds (UTC)
pub const CREATE_TABLES: &str = r#"
-- Symbols that made it into a top-N selection at least once
CREATE TABLE IF NOT EXISTS recurring_rockets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL UNIQUE,
    streak_count INTEGER NOT NULL DEFAULT 1 CHECK (streak_count >= 1),
    last_seen INTEGER NOT NULL
);

-- Completed short-term trade outcomes (append-only, swept after 30 days)
CREATE TABLE IF NOT EXISTS engine_short_hits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL,
    ts INTEGER NOT NULL,
    gain_pct REAL NOT NULL
);

-- Per-symbol hit-rate aggregates, overwritten on every recompute
CREATE TABLE IF NOT EXISTS engine_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL UNIQUE,
    hit_rate_7d REAL NOT NULL DEFAULT 0,
    hit_rate_30d REAL NOT NULL DEFAULT 0,
    total_signals INTEGER NOT NULL DEFAULT 0,
    last_updated INTEGER NOT NULL
);

-- ========== INDEXES ==========

CREATE INDEX IF NOT EXISTS idx_recurring_streak ON recurring_rockets(streak_count DESC, symbol ASC);
CREATE INDEX IF NOT EXISTS idx_hits_ts ON engine_short_hits(ts);
CREATE INDEX IF NOT EXISTS idx_hits_symbol_ts ON engine_short_hits(symbol, ts)
"#;

