//! Binance public API client for market data (no authentication required)

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::MarketDataSource;
use crate::types::Kline;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const MAX_KLINES_PER_REQUEST: u32 = 1000;

/// Binance public market data client
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    interval: String,
    limit: u32,
}

/// Raw kline data from Binance API (array of arrays)
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawKline(
    i64,    // 0: Open time
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    i64,    // 6: Close time
    String, // 7: Quote asset volume
    u64,    // 8: Number of trades
    String, // 9: Taker buy base
    String, // 10: Taker buy quote
    String, // 11: Ignore
);

impl BinanceClient {
    /// Client fetching the latest `limit` bars of `interval` per symbol
    pub fn new(base_url: &str, interval: &str, limit: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            interval: interval.to_string(),
            limit: limit.clamp(1, MAX_KLINES_PER_REQUEST),
        })
    }

    /// Fetch the most recent klines (candlestick data) for a symbol
    pub async fn get_klines(&self, symbol: &str) -> Result<Vec<Kline>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, self.interval, self.limit
        );

        debug!(symbol, interval = %self.interval, "Fetching klines from Binance");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance API error {}: {}", status, body);
        }

        let body = response.text().await?;
        let klines = parse_klines(&body)?;

        debug!(symbol, count = klines.len(), "Fetched klines");
        Ok(klines)
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    async fn fetch(&self, symbol: &str) -> Result<Vec<Kline>> {
        self.get_klines(symbol).await
    }
}

/// Decode a `/api/v3/klines` body; rows with unparsable prices are dropped
pub fn parse_klines(body: &str) -> Result<Vec<Kline>> {
    let raw_klines: Vec<RawKline> =
        serde_json::from_str(body).context("Malformed klines response")?;

    Ok(raw_klines
        .into_iter()
        .filter_map(|raw| {
            Some(Kline {
                open_time: raw.0,
                open: Decimal::from_str(&raw.1).ok()?,
                high: Decimal::from_str(&raw.2).ok()?,
                low: Decimal::from_str(&raw.3).ok()?,
                close: Decimal::from_str(&raw.4).ok()?,
                volume: Decimal::from_str(&raw.5).ok()?,
                close_time: raw.6,
            })
        })
        .collect())
}
