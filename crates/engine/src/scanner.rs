//! Rocket scanner — the once-a-minute scan loop
//!
//! Each iteration loads the symbol list, then for every symbol in order:
//! fetch klines → compute indicator features → score. Symbols that fail at
//! any step are skipped with a typed reason. Scored symbols are ranked and
//! the top N are recorded in the selection store.

use crate::api::MarketDataSource;
use crate::indicators::{IndicatorEngine, TaIndicatorEngine};
use crate::pacing::{sleep_unless_cancelled, until_next_minute};
use crate::scoring::{RocketScorer, Scorer};
use crate::symbols::SymbolSource;
use crate::types::{ReferenceRanges, ScanReport, ScoredSymbol, SkipReason, SymbolOutcome};
use chrono::Utc;
use persistence::{DbError, SelectionStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Failures that abort a whole iteration (never the process)
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to load symbols: {0}")]
    Symbols(#[from] std::io::Error),

    #[error("failed to record selection of {symbol}: {source}")]
    Store {
        symbol: String,
        #[source]
        source: DbError,
    },
}

/// The scan loop with all of its collaborators
pub struct Scanner {
    symbols: Arc<dyn SymbolSource>,
    data: Arc<dyn MarketDataSource>,
    indicators: Arc<dyn IndicatorEngine>,
    scorer: Arc<dyn Scorer>,
    ranges: ReferenceRanges,
    store: Arc<dyn SelectionStore>,
    top_n: usize,
    fetch_timeout: Option<Duration>,
}

impl Scanner {
    /// Scanner with the default indicator engine, scorer and reference ranges
    pub fn new(
        symbols: Arc<dyn SymbolSource>,
        data: Arc<dyn MarketDataSource>,
        store: Arc<dyn SelectionStore>,
        top_n: usize,
    ) -> Self {
        Self {
            symbols,
            data,
            indicators: Arc::new(TaIndicatorEngine::default()),
            scorer: Arc::new(RocketScorer),
            ranges: ReferenceRanges::default(),
            store,
            top_n,
            fetch_timeout: None,
        }
    }

    pub fn with_indicators(mut self, indicators: Arc<dyn IndicatorEngine>) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_ranges(mut self, ranges: ReferenceRanges) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Run a single scan iteration
    pub async fn run_once(&self) -> Result<ScanReport, ScanError> {
        let symbols = self.symbols.load_symbols().await?;
        let started = std::time::Instant::now();

        let mut report = ScanReport::default();
        let mut scored = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let outcome = self.evaluate(&symbol).await;
            match &outcome {
                SymbolOutcome::Scored { score } => scored.push(ScoredSymbol {
                    symbol: symbol.clone(),
                    score: *score,
                }),
                SymbolOutcome::Skipped { reason } => {
                    debug!(symbol = %symbol, reason = %reason, "Symbol skipped");
                }
            }
            report.outcomes.push((symbol, outcome));
        }

        report.ranked = rank_scores(scored);
        report.selected = report.ranked.iter().take(self.top_n).cloned().collect();

        for pick in &report.selected {
            self.store
                .record_selection(&pick.symbol)
                .await
                .map_err(|source| ScanError::Store {
                    symbol: pick.symbol.clone(),
                    source,
                })?;
        }

        info!(
            at = %Utc::now().format("%H:%M:%S"),
            selected = ?report.selected_symbols(),
            scored = report.ranked.len(),
            skipped = report.skipped().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Updated recurring rockets"
        );

        Ok(report)
    }

    /// Run iterations aligned to wall-clock minutes until `cancelled` is set.
    /// Iteration failures are logged and the loop carries on.
    pub async fn run_forever(&self, cancelled: &AtomicBool) {
        info!(top_n = self.top_n, "Rocket scan loop started");
        let mut cycle: u64 = 0;

        loop {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }

            cycle += 1;
            if let Err(e) = self.run_once().await {
                error!(cycle, error = %e, "Scan iteration failed");
            }

            if !sleep_unless_cancelled(until_next_minute(Utc::now()), cancelled).await {
                break;
            }
        }

        info!(cycles = cycle, "Rocket scan loop stopped");
    }

    /// Fetch, compute and score one symbol
    async fn evaluate(&self, symbol: &str) -> SymbolOutcome {
        let fetch = self.data.fetch(symbol);
        let fetched = match self.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(result) => result,
                Err(_) => return skipped(SkipReason::Timeout),
            },
            None => fetch.await,
        };

        let klines = match fetched {
            Ok(klines) if klines.is_empty() => return skipped(SkipReason::NoData),
            Ok(klines) => klines,
            Err(e) => return skipped(SkipReason::Fetch(format!("{e:#}"))),
        };

        let features = match self.indicators.compute(&klines) {
            Ok(features) => features,
            Err(e) => return skipped(SkipReason::Indicators(e.to_string())),
        };

        let score = self.scorer.score(&features, &self.ranges);
        if !score.is_finite() {
            return skipped(SkipReason::Score);
        }

        SymbolOutcome::Scored { score }
    }
}

fn skipped(reason: SkipReason) -> SymbolOutcome {
    SymbolOutcome::Skipped { reason }
}

/// Sort best first; equal scores keep their input order
pub fn rank_scores(mut scored: Vec<ScoredSymbol>) -> Vec<ScoredSymbol> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}
