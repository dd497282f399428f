//! Indicator engine for the rocket scan
//!
//! Runs the `ta` indicators bar-by-bar over a kline series and keeps the
//! latest value of each, producing the fixed `IndicatorFeatures` set the
//! scorer consumes.

use crate::types::{IndicatorFeatures, Kline};
use rust_decimal::prelude::ToPrimitive;
use ta::indicators::{
    AverageTrueRange, BollingerBands, FastStochastic, MovingAverageConvergenceDivergence,
    RelativeStrengthIndex,
};
use ta::{Close, DataItem, Next};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("need at least {needed} bars, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("invalid bar at {open_time}: {reason}")]
    InvalidBar { open_time: i64, reason: String },

    #[error("invalid indicator parameter: {0}")]
    Parameter(String),

    #[error("indicator produced a non-finite value")]
    NonFinite,
}

/// Trait for turning a kline series into the feature set
pub trait IndicatorEngine: Send + Sync {
    fn compute(&self, klines: &[Kline]) -> Result<IndicatorFeatures, IndicatorError>;
}

// ============================================================================
// Settings
// ============================================================================

/// Periods for each indicator in the feature set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub stoch_period: usize,
    pub atr_period: usize,
    pub bb_period: usize,
    pub bb_multiplier: f64,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            stoch_period: 14,
            atr_period: 14,
            bb_period: 20,
            bb_multiplier: 2.0,
        }
    }
}

impl IndicatorSettings {
    /// Bars needed before every indicator has warmed up
    pub fn min_bars(&self) -> usize {
        [
            self.rsi_period + 1,
            self.macd_slow + self.macd_signal,
            self.stoch_period,
            self.atr_period + 1,
            self.bb_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

// ============================================================================
// ta-backed engine
// ============================================================================

/// Indicator engine backed by the `ta` crate
#[derive(Debug, Clone, Default)]
pub struct TaIndicatorEngine {
    settings: IndicatorSettings,
}

impl TaIndicatorEngine {
    pub fn new(settings: IndicatorSettings) -> Self {
        Self { settings }
    }
}

impl IndicatorEngine for TaIndicatorEngine {
    fn compute(&self, klines: &[Kline]) -> Result<IndicatorFeatures, IndicatorError> {
        let s = &self.settings;
        let needed = s.min_bars();
        if klines.len() < needed {
            return Err(IndicatorError::InsufficientData {
                needed,
                got: klines.len(),
            });
        }

        let param = |e: ta::errors::TaError| IndicatorError::Parameter(format!("{e:?}"));
        let mut rsi = RelativeStrengthIndex::new(s.rsi_period).map_err(param)?;
        let mut macd = MovingAverageConvergenceDivergence::new(s.macd_fast, s.macd_slow, s.macd_signal)
            .map_err(param)?;
        let mut stoch = FastStochastic::new(s.stoch_period).map_err(param)?;
        let mut atr = AverageTrueRange::new(s.atr_period).map_err(param)?;
        let mut bb = BollingerBands::new(s.bb_period, s.bb_multiplier).map_err(param)?;

        let mut features = IndicatorFeatures {
            rsi: f64::NAN,
            macd_hist: f64::NAN,
            stoch_k: f64::NAN,
            atrp: f64::NAN,
            bbp: f64::NAN,
        };

        for kline in klines {
            let item = to_data_item(kline)?;
            let close = item.close();

            features.rsi = rsi.next(close);
            features.macd_hist = macd.next(close).histogram;
            features.stoch_k = stoch.next(&item);

            let atr_val = atr.next(&item);
            features.atrp = if close > 0.0 {
                atr_val / close * 100.0
            } else {
                f64::NAN
            };

            let bands = bb.next(close);
            let width = bands.upper - bands.lower;
            // Zero-width bands: price sits on the average
            features.bbp = if width > 0.0 {
                (close - bands.lower) / width
            } else {
                0.5
            };
        }

        if !features.is_finite() {
            return Err(IndicatorError::NonFinite);
        }

        Ok(features)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn to_f64(value: rust_decimal::Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

fn to_data_item(kline: &Kline) -> Result<DataItem, IndicatorError> {
    DataItem::builder()
        .open(to_f64(kline.open))
        .high(to_f64(kline.high))
        .low(to_f64(kline.low))
        .close(to_f64(kline.close))
        .volume(to_f64(kline.volume))
        .build()
        .map_err(|e| IndicatorError::InvalidBar {
            open_time: kline.open_time,
            reason: format!("{e:?}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn make_klines(prices: &[f64]) -> Vec<Kline> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let price = Decimal::from_str_exact(&format!("{:.2}", p)).unwrap();
                Kline {
                    open_time: (i as i64) * 60000,
                    open: price,
                    high: price + dec!(1),
                    low: price - dec!(1),
                    close: price,
                    volume: dec!(100),
                    close_time: ((i + 1) as i64) * 60000 - 1,
                }
            })
            .collect()
    }

    fn zigzag(start: f64, step: f64, bars: usize) -> Vec<f64> {
        (0..bars)
            .map(|i| start + step * i as f64 + if i % 2 == 0 { 0.0 } else { 0.4 })
            .collect()
    }

    #[test]
    fn test_min_bars_default() {
        assert_eq!(IndicatorSettings::default().min_bars(), 35);
    }

    #[test]
    fn test_short_series_rejected() {
        let engine = TaIndicatorEngine::default();
        let klines = make_klines(&zigzag(100.0, 0.5, 20));
        assert_eq!(
            engine.compute(&klines),
            Err(IndicatorError::InsufficientData { needed: 35, got: 20 })
        );
    }

    #[test]
    fn test_custom_periods_warm_up_sooner() {
        let engine = TaIndicatorEngine::new(IndicatorSettings {
            rsi_period: 5,
            macd_fast: 3,
            macd_slow: 6,
            macd_signal: 3,
            stoch_period: 5,
            atr_period: 5,
            bb_period: 10,
            bb_multiplier: 2.0,
        });
        let klines = make_klines(&zigzag(100.0, 0.5, 20));

        let features = engine.compute(&klines).unwrap();
        assert!(features.is_finite());
        assert!(features.rsi > 50.0, "rsi = {}", features.rsi);
    }

    #[test]
    fn test_uptrend_features() {
        let engine = TaIndicatorEngine::default();
        let klines = make_klines(&zigzag(100.0, 0.8, 60));
        let features = engine.compute(&klines).unwrap();

        assert!(features.is_finite());
        assert!(features.rsi > 50.0, "rsi = {}", features.rsi);
        assert!(features.macd_hist.is_finite());
        assert!((0.0..=100.0).contains(&features.stoch_k));
        assert!(features.atrp > 0.0);
        assert!(features.bbp > 0.5, "bbp = {}", features.bbp);
    }

    #[test]
    fn test_downtrend_rsi_below_midline() {
        let engine = TaIndicatorEngine::default();
        let klines = make_klines(&zigzag(200.0, -0.8, 60));
        let features = engine.compute(&klines).unwrap();

        assert!(features.rsi < 50.0, "rsi = {}", features.rsi);
        assert!(features.bbp < 0.5, "bbp = {}", features.bbp);
    }

    #[test]
    fn test_inverted_bar_is_invalid() {
        let engine = TaIndicatorEngine::default();
        let mut klines = make_klines(&zigzag(100.0, 0.5, 40));
        klines[10].high = klines[10].low - dec!(5);

        match engine.compute(&klines) {
            Err(IndicatorError::InvalidBar { open_time, .. }) => assert_eq!(open_time, 600000),
            other => panic!("expected InvalidBar, got {other:?}"),
        }
    }
}
