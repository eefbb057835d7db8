//! Folio CLI - Command line interface for the portfolio metrics engine.
//!
//! Every command prints one JSON `ApiResponse` on stdout. Logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_core::{
    aggregate, classify,
    classify::{cash_equivalent_return, separate_positions},
    config::EngineConfig,
    metrics::{max_drawdown_detail, CorrelationMatrix},
    portfolio::{expected_return, PortfolioSnapshot, SnapshotStore},
    series, ApiResponse, LookbackWindow, MetricsEngine, Validator,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio portfolio CLI - risk and performance metrics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the metrics bundle and its validation report
    Metrics {
        /// Snapshot file (defaults to ~/.folio/snapshot.json)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Lookback window: 3m, 6m, 1y or 3y
        #[arg(short, long, default_value = "1y")]
        window: LookbackWindow,
        /// Annual risk-free rate as a decimal (overrides the snapshot)
        #[arg(short, long)]
        risk_free_rate: Option<f64>,
        /// Engine config file (defaults to ~/.folio/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run the data-quality checks only
    Validate {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long, default_value = "1y")]
        window: LookbackWindow,
    },
    /// Aggregate values, weights and sector allocation
    Summary {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Pairwise correlation of the snapshot's daily returns
    Correlation {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Classify ticker symbols
    Classify {
        /// Ticker symbols
        #[arg(required = true)]
        tickers: Vec<String>,
        /// Rate assumed for money market yields
        #[arg(short, long)]
        risk_free_rate: Option<f64>,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Metrics {
            input,
            window,
            risk_free_rate,
            config,
        } => handle_metrics(input, window, risk_free_rate, config),
        Commands::Validate { input, window } => handle_validate(input, window),
        Commands::Summary { input } => handle_summary(input),
        Commands::Correlation { input } => handle_correlation(input),
        Commands::Classify {
            tickers,
            risk_free_rate,
        } => handle_classify(&tickers, risk_free_rate),
    };

    let (failed, output) = match result {
        Ok(data) => (false, serde_json::to_string_pretty(&ApiResponse::ok(data))),
        Err(e) => (
            true,
            serde_json::to_string_pretty(&ApiResponse::<()>::err(format!("{e:#}"))),
        ),
    };

    match output {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to encode response: {e}"),
    }
    if failed {
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_snapshot(input: Option<PathBuf>) -> anyhow::Result<PortfolioSnapshot> {
    let store = input
        .map(SnapshotStore::with_path)
        .unwrap_or_default();
    let snapshot = store
        .load()
        .with_context(|| format!("failed to load snapshot from {}", store.path().display()))?;
    info!(
        path = %store.path().display(),
        positions = snapshot.positions.len(),
        tickers = snapshot.historical.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(EngineConfig::default_path);
    EngineConfig::load_from_path(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))
}

fn handle_metrics(
    input: Option<PathBuf>,
    window: LookbackWindow,
    risk_free_rate: Option<f64>,
    config: Option<PathBuf>,
) -> anyhow::Result<Value> {
    let engine = MetricsEngine::new(load_config(config.as_deref())?);
    let snapshot = load_snapshot(input)?;
    let rate = engine.risk_free_rate(risk_free_rate.or(snapshot.risk_free_rate));

    let (metrics, report) = engine.evaluate(
        &snapshot.positions,
        &snapshot.historical,
        &snapshot.benchmark,
        rate,
        window,
    );

    let (equity, _) = separate_positions(&snapshot.classified_positions());
    let values = series::values(&series::align(&snapshot.historical, &equity));

    Ok(json!({
        "window": window,
        "risk_free_rate": rate,
        "severity": report.severity(),
        "metrics": metrics,
        "drawdown": max_drawdown_detail(&values),
        "validation": report,
    }))
}

fn handle_validate(input: Option<PathBuf>, window: LookbackWindow) -> anyhow::Result<Value> {
    let snapshot = load_snapshot(input)?;
    let validator = Validator::default();

    let mut report = validator.check_positions(&snapshot.classified_positions());
    report.merge(validator.check_historical(&snapshot.historical, window));

    Ok(json!({
        "window": window,
        "severity": report.severity(),
        "validation": report,
    }))
}

fn handle_summary(input: Option<PathBuf>) -> anyhow::Result<Value> {
    let snapshot = load_snapshot(input)?;
    let summary = aggregate(&snapshot.positions);
    let expected = expected_return(&summary.positions);

    Ok(json!({
        "summary": summary,
        "expected_return": expected,
    }))
}

fn handle_correlation(input: Option<PathBuf>) -> anyhow::Result<Value> {
    let snapshot = load_snapshot(input)?;
    let matrix = CorrelationMatrix::from_returns(&series::returns_by_ticker(&snapshot.historical));
    Ok(json!({ "correlation": matrix }))
}

fn handle_classify(tickers: &[String], risk_free_rate: Option<f64>) -> anyhow::Result<Value> {
    let rate = folio_core::resolve_risk_free_rate(risk_free_rate);

    let results: Vec<Value> = tickers
        .iter()
        .map(|ticker| {
            let classification = classify(ticker);
            json!({
                "ticker": ticker.trim().to_uppercase(),
                "asset_class": classification.asset_class,
                "is_cash_equivalent": classification.is_cash_equivalent,
                "sector": classification.sector_label(None),
                "assumed_yield": cash_equivalent_return(ticker, rate),
            })
        })
        .collect();

    Ok(json!({ "classifications": results }))
}
