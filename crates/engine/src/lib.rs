//! Rocket Catcher engine — the once-a-minute market scan
//!
//! Provides:
//! - Binance public API client for kline history
//! - Indicator features (RSI, MACD histogram, stochastic %K, ATR%, %B)
//! - Rocket scoring against reference ranges and score ranking
//! - The scan loop that records the top-N selections every minute
//! - The retention sweeper for expired trade outcomes

pub mod api;
pub mod config;
pub mod indicators;
pub mod pacing;
pub mod retention;
pub mod scanner;
pub mod scoring;
pub mod symbols;
pub mod types;

// Re-exports for convenience
pub use api::{BinanceClient, MarketDataSource};
pub use config::{ConfigError, ScanConfig};
pub use indicators::{IndicatorEngine, IndicatorError, IndicatorSettings, TaIndicatorEngine};
pub use retention::run_retention_sweeper;
pub use scanner::{rank_scores, ScanError, Scanner};
pub use scoring::{RocketScorer, Scorer};
pub use symbols::{SymbolSource, TickerFile};
pub use types::*;
