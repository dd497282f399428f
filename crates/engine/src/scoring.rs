//! Rocket score — maps a feature set onto a single ranking number

use crate::types::{IndicatorFeatures, Range, ReferenceRanges};

/// Scalar score from features against reference ranges; higher is better
pub trait Scorer: Send + Sync {
    fn score(&self, features: &IndicatorFeatures, ranges: &ReferenceRanges) -> f64;
}

/// Equal-weight score: each feature is placed inside its reference range
/// (clamped to [0, 1]) and the mean is scaled to 0–100.
#[derive(Debug, Clone, Copy, Default)]
pub struct RocketScorer;

impl Scorer for RocketScorer {
    fn score(&self, features: &IndicatorFeatures, ranges: &ReferenceRanges) -> f64 {
        let parts = [
            normalise(features.rsi, ranges.rsi),
            normalise(features.macd_hist, ranges.macd_hist),
            normalise(features.stoch_k, ranges.stoch_k),
            normalise(features.atrp, ranges.atrp),
            normalise(features.bbp, ranges.bbp),
        ];
        parts.iter().sum::<f64>() / parts.len() as f64 * 100.0
    }
}

/// Position of `value` within `range`, clamped to [0, 1]
fn normalise(value: f64, range: Range) -> f64 {
    let width = range.max - range.min;
    if width <= 0.0 {
        return if value >= range.max { 1.0 } else { 0.0 };
    }
    ((value - range.min) / width).clamp(0.0, 1.0)
}
