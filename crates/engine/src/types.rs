//! Types shared by the scan loop and its collaborators

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single candlestick (OHLCV)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kline {
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: i64,
}

/// Fixed feature set computed from a kline series (latest bar values)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFeatures {
    /// Relative strength index, 0–100
    pub rsi: f64,
    /// MACD histogram (MACD line minus signal line)
    pub macd_hist: f64,
    /// Fast stochastic %K, 0–100
    pub stoch_k: f64,
    /// Average true range as a percentage of the close
    pub atrp: f64,
    /// Bollinger %B (0 = lower band, 1 = upper band)
    pub bbp: f64,
}

impl IndicatorFeatures {
    pub fn is_finite(&self) -> bool {
        [self.rsi, self.macd_hist, self.stoch_k, self.atrp, self.bbp]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Inclusive (min, max) bounds used to normalise one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Per-indicator reference ranges for the scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRanges {
    pub rsi: Range,
    pub macd_hist: Range,
    pub stoch_k: Range,
    pub atrp: Range,
    pub bbp: Range,
}

impl Default for ReferenceRanges {
    fn default() -> Self {
        Self {
            rsi: Range::new(30.0, 70.0),
            macd_hist: Range::new(-0.5, 0.5),
            stoch_k: Range::new(20.0, 80.0),
            atrp: Range::new(0.2, 3.0),
            bbp: Range::new(0.0, 1.0),
        }
    }
}

/// A symbol that made it through fetch, indicators and scoring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSymbol {
    pub symbol: String,
    pub score: f64,
}

/// Why a symbol dropped out of an iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fetch succeeded but returned no bars
    NoData,
    /// Network or API failure while fetching
    Fetch(String),
    /// Fetch exceeded the per-symbol timeout
    Timeout,
    /// Indicator computation failed
    Indicators(String),
    /// Scorer produced a non-finite value
    Score,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::Fetch(e) => write!(f, "fetch failed: {e}"),
            SkipReason::Timeout => write!(f, "fetch timed out"),
            SkipReason::Indicators(e) => write!(f, "indicators failed: {e}"),
            SkipReason::Score => write!(f, "non-finite score"),
        }
    }
}

/// Per-symbol result of one scan iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Scored { score: f64 },
    Skipped { reason: SkipReason },
}

/// Everything one iteration produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Outcome of each symbol in input order
    pub outcomes: Vec<(String, SymbolOutcome)>,
    /// Successfully scored symbols, ranked best first
    pub ranked: Vec<ScoredSymbol>,
    /// The top-N slice of `ranked` that was recorded
    pub selected: Vec<ScoredSymbol>,
}

impl ScanReport {
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.outcomes.iter().filter_map(|(symbol, outcome)| match outcome {
            SymbolOutcome::Skipped { reason } => Some((symbol.as_str(), reason)),
            SymbolOutcome::Scored { .. } => None,
        })
    }

    pub fn selected_symbols(&self) -> Vec<&str> {
        self.selected.iter().map(|s| s.symbol.as_str()).collect()
    }
}
