//! Rocket Catcher — minute-by-minute momentum scanner
//!
//! Usage:
//!   rocket-catcher run                     — Scan every minute until Ctrl+C
//!   rocket-catcher once                    — Run a single scan iteration
//!   rocket-catcher top --limit 20          — Show the most persistent rockets
//!   rocket-catcher log-hit BTCUSDT 2.5     — Record a trade outcome
//!   rocket-catcher metrics BTCUSDT         — Recompute hit rates for a symbol
//!   rocket-catcher sweep                   — Purge expired trade outcomes

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use engine::{
    run_retention_sweeper, BinanceClient, ScanConfig, ScanReport, Scanner, TickerFile,
};
use persistence::repository::{MetricsSummary, RecurringEntry};
use persistence::{Database, MetricsStore, DEFAULT_RECURRING_LIMIT};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser)]
#[command(name = "rocket-catcher")]
#[command(about = "Minute-by-minute momentum scanner with recurring-rocket tracking", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every minute until Ctrl+C
    Run {
        /// Ticker file (overrides ROCKET_TICKERS_FILE)
        #[arg(long)]
        tickers: Option<PathBuf>,
        /// Number of symbols selected per iteration (overrides ROCKET_TOP_N)
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Run a single scan iteration and print the ranking
    Once {
        /// Ticker file (overrides ROCKET_TICKERS_FILE)
        #[arg(long)]
        tickers: Option<PathBuf>,
        /// Number of symbols selected (overrides ROCKET_TOP_N)
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Show the symbols with the longest selection streaks
    Top {
        #[arg(long, default_value_t = DEFAULT_RECURRING_LIMIT)]
        limit: usize,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a realised trade outcome and refresh the symbol's metrics
    LogHit {
        symbol: String,
        /// Percentage gain (negative for a loss)
        #[arg(allow_negative_numbers = true)]
        gain_pct: f64,
    },
    /// Recompute and show 7d/30d hit rates for a symbol
    Metrics {
        symbol: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete trade outcomes older than the retention window
    Sweep,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,persistence=debug,rocket_catcher=debug,sqlx=warn")
    } else {
        EnvFilter::new("info,engine=info,persistence=info,rocket_catcher=info,sqlx=warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    let config = ScanConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Run { tickers, top_n } => {
            cmd_run(with_overrides(config, tickers, top_n)).await?;
        }
        Commands::Once { tickers, top_n } => {
            cmd_once(with_overrides(config, tickers, top_n)).await?;
        }
        Commands::Top { limit, json } => {
            cmd_top(&config, limit, json).await?;
        }
        Commands::LogHit { symbol, gain_pct } => {
            cmd_log_hit(&config, &symbol, gain_pct).await?;
        }
        Commands::Metrics { symbol, json } => {
            cmd_metrics(&config, &symbol, json).await?;
        }
        Commands::Sweep => {
            cmd_sweep(&config).await?;
        }
    }

    Ok(())
}

fn with_overrides(
    mut config: ScanConfig,
    tickers: Option<PathBuf>,
    top_n: Option<usize>,
) -> ScanConfig {
    if let Some(path) = tickers {
        config.tickers_file = path;
    }
    if let Some(n) = top_n.filter(|n| *n > 0) {
        config.top_n = n;
    }
    config
}

async fn open_store(config: &ScanConfig) -> anyhow::Result<MetricsStore> {
    let db_path = config.db_path();
    let db = Database::new(&db_path).await.map_err(|e| {
        error!("Failed to initialize database: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;
    info!("Database opened: {}", db_path.display());
    Ok(MetricsStore::new(db.pool_clone()))
}

fn build_scanner(config: &ScanConfig, store: &MetricsStore) -> anyhow::Result<Scanner> {
    let tickers = TickerFile::new(&config.tickers_file);
    if !tickers.path().is_file() {
        anyhow::bail!("Ticker file not found: {}", tickers.path().display());
    }
    info!(path = %tickers.path().display(), "Ticker file found");

    let binance = BinanceClient::new(&config.binance_url, &config.kline_interval, config.kline_limit)?;

    Ok(Scanner::new(
        Arc::new(tickers),
        Arc::new(binance),
        Arc::new(store.clone()),
        config.top_n,
    )
    .with_fetch_timeout(config.fetch_timeout))
}

async fn cmd_run(config: ScanConfig) -> anyhow::Result<()> {
    println!("\n=== Rocket Catcher v{} ===", APP_VERSION);

    let store = open_store(&config).await?;
    let scanner = build_scanner(&config, &store)?;

    println!("Database: {}", config.db_path().display());
    println!("Tickers: {}", config.tickers_file.display());
    println!(
        "Top N: {} | Interval: {} x {} | Sweep every {}s",
        config.top_n,
        config.kline_interval,
        config.kline_limit,
        config.sweep_interval.as_secs()
    );
    println!("Press Ctrl+C to stop\n");

    let cancelled = Arc::new(AtomicBool::new(false));

    let cancel_on_ctrlc = cancelled.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl+C received, stopping after the current iteration...");
        cancel_on_ctrlc.store(true, Ordering::Relaxed);
    });

    let sweeper = tokio::spawn(run_retention_sweeper(
        store.clone(),
        config.sweep_interval,
        cancelled.clone(),
    ));

    scanner.run_forever(&cancelled).await;

    if let Err(e) = sweeper.await {
        error!("Retention sweeper task failed: {}", e);
    }
    info!("Rocket Catcher stopped");
    Ok(())
}

async fn cmd_once(config: ScanConfig) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    let scanner = build_scanner(&config, &store)?;

    let report = scanner.run_once().await?;
    print_report(&report, config.top_n);
    Ok(())
}

fn print_report(report: &ScanReport, top_n: usize) {
    println!("\nTop {} Rockets:", report.selected.len().min(top_n));
    println!("  {:>3}  {:<14} {:>8}", "#", "Symbol", "Score");
    println!("  {}", "-".repeat(28));
    for (i, pick) in report.selected.iter().enumerate() {
        println!("  {:>3}  {:<14} {:>8.2}", i + 1, pick.symbol, pick.score);
    }

    let skipped: Vec<_> = report.skipped().collect();
    if !skipped.is_empty() {
        println!("\nSkipped {} of {}:", skipped.len(), report.outcomes.len());
        for (symbol, reason) in skipped {
            println!("  {:<14} {}", symbol, reason);
        }
    }
}

async fn cmd_top(config: &ScanConfig, limit: usize, json: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let entries = store
        .load_top_recurring(limit)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load recurring rockets: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_recurring(&entries);
    }
    Ok(())
}

fn print_recurring(entries: &[RecurringEntry]) {
    if entries.is_empty() {
        println!("\nNo recurring rockets yet.");
        return;
    }

    let now = Utc::now();
    println!("\nRecurring Rockets:");
    println!("  {:>3}  {:<14} {:>7} {:>20} {:>9}", "#", "Symbol", "Streak", "Last seen", "Ago");
    println!("  {}", "-".repeat(58));
    for (i, entry) in entries.iter().enumerate() {
        let ago = (now - entry.last_seen).num_minutes().max(0);
        println!(
            "  {:>3}  {:<14} {:>7} {:>20} {:>7}m",
            i + 1,
            entry.symbol,
            entry.streak_count,
            entry.last_seen.format("%Y-%m-%d %H:%M:%S"),
            ago,
        );
    }
}

async fn cmd_log_hit(config: &ScanConfig, symbol: &str, gain_pct: f64) -> anyhow::Result<()> {
    if !gain_pct.is_finite() {
        anyhow::bail!("gain_pct must be a finite number, got {}", gain_pct);
    }

    let store = open_store(config).await?;
    let summary = store
        .log_outcome_and_refresh(symbol, gain_pct)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to log outcome: {}", e))?;

    info!(symbol, gain_pct, "Outcome logged");
    print_summary(&summary);
    Ok(())
}

async fn cmd_metrics(config: &ScanConfig, symbol: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let summary = store
        .recompute_metrics(symbol)
        .await
        .map_err(|e| anyhow::anyhow!("Metrics recompute failed: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_summary(&summary);
    let recent = store
        .recent_outcomes(symbol)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load outcomes: {}", e))?;
    if let Some(latest) = recent.first() {
        println!(
            "  Latest outcome: {:+.2}% at {}",
            latest.gain_pct,
            latest.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

fn print_summary(summary: &MetricsSummary) {
    println!("\n{} metrics:", summary.symbol);
    println!("  Hit rate 7d:   {:>6.2}%", summary.hit_rate_7d);
    println!("  Hit rate 30d:  {:>6.2}%", summary.hit_rate_30d);
    println!("  Signals (30d): {:>6}", summary.total_signals);
    println!("  Updated:       {}", summary.last_updated.format("%Y-%m-%d %H:%M:%S"));
}

async fn cmd_sweep(config: &ScanConfig) -> anyhow::Result<()> {
    info!("Rocket Catcher sweep — removing outcomes past the retention window");

    let store = open_store(config).await?;
    let deleted = store
        .purge_expired()
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;
    let remaining = store
        .stored_outcomes()
        .await
        .map_err(|e| anyhow::anyhow!("Count failed: {}", e))?;

    info!("Done! Deleted {} records, {} remaining.", deleted, remaining);
    Ok(())
}
