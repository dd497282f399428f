//! Market data sources

pub mod binance;

pub use binance::BinanceClient;

use crate::types::Kline;
use anyhow::Result;
use async_trait::async_trait;

/// Anything that can return a recent kline series for a symbol.
/// An empty series means "no data right now", not an error.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<Vec<Kline>>;
}
