//! Scan configuration from environment variables
//!
//! Environment variables (all optional):
//! - `ROCKET_DB_URI` (default: data), directory holding the store
//! - `ROCKET_DB_NAME` (default: rocket_catcher), database name, stored as `<name>.db`
//! - `ROCKET_TICKERS_FILE` (default: tickers.txt)
//! - `ROCKET_TOP_N` (default: 15)
//! - `ROCKET_KLINE_INTERVAL` (default: 1m)
//! - `ROCKET_KLINE_LIMIT` (default: 120)
//! - `ROCKET_FETCH_TIMEOUT_SECS` (default: 20, 0 disables)
//! - `ROCKET_SWEEP_INTERVAL_SECS` (default: 3600)
//! - `ROCKET_BINANCE_URL` (default: https://api.binance.com)

use crate::api::binance::DEFAULT_BASE_URL;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration for the scan worker
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub db_uri: String,
    pub db_name: String,
    pub tickers_file: PathBuf,
    pub top_n: usize,
    pub kline_interval: String,
    pub kline_limit: u32,
    /// Per-symbol fetch bound; `None` waits indefinitely
    pub fetch_timeout: Option<Duration>,
    pub sweep_interval: Duration,
    pub binance_url: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            db_uri: "data".to_string(),
            db_name: "rocket_catcher".to_string(),
            tickers_file: PathBuf::from("tickers.txt"),
            top_n: 15,
            kline_interval: "1m".to_string(),
            kline_limit: 120,
            fetch_timeout: Some(Duration::from_secs(20)),
            sweep_interval: Duration::from_secs(3600),
            binance_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let text = |var: &str, default: String| lookup(var).unwrap_or(default);

        let top_n: usize = parse_var(&lookup, "ROCKET_TOP_N", defaults.top_n)?;
        if top_n == 0 {
            return Err(ConfigError::Invalid {
                var: "ROCKET_TOP_N",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let timeout_secs: u64 = parse_var(
            &lookup,
            "ROCKET_FETCH_TIMEOUT_SECS",
            defaults.fetch_timeout.map(|d| d.as_secs()).unwrap_or(0),
        )?;
        let sweep_secs: u64 = parse_var(
            &lookup,
            "ROCKET_SWEEP_INTERVAL_SECS",
            defaults.sweep_interval.as_secs(),
        )?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "ROCKET_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            db_uri: text("ROCKET_DB_URI", defaults.db_uri),
            db_name: text("ROCKET_DB_NAME", defaults.db_name),
            tickers_file: lookup("ROCKET_TICKERS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.tickers_file),
            top_n,
            kline_interval: text("ROCKET_KLINE_INTERVAL", defaults.kline_interval),
            kline_limit: parse_var(&lookup, "ROCKET_KLINE_LIMIT", defaults.kline_limit)?,
            fetch_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            sweep_interval: Duration::from_secs(sweep_secs),
            binance_url: text("ROCKET_BINANCE_URL", defaults.binance_url),
        })
    }

    /// Location of the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.db_uri).join(format!("{}.db", self.db_name))
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
