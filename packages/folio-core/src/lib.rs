//! Folio Core - Portfolio risk and performance metrics engine.
//!
//! This crate turns position snapshots and per-ticker daily closes into
//! risk-adjusted performance statistics:
//!
//! - **Classification**: Money market funds and treasury yields are cash equivalents
//! - **Aggregation**: Value, cost, weights, sector allocation, concentration
//! - **Alignment**: Per-ticker closes merged into one portfolio value series
//! - **Metrics**: Sharpe, Sortino, beta/alpha, drawdown, VaR/CVaR and more
//! - **Validation**: Advisory data-quality report produced alongside the metrics
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_core::{compute_metrics, HistoricalData, LookbackWindow, Position};
//!
//! let positions = vec![Position::new("AAPL", 10.0, 100.0, 150.0)?];
//! let historical = HistoricalData::new();
//!
//! // Without history the bundle falls back to neutral values and says so
//! let (metrics, report) =
//!     compute_metrics(&positions, &historical, &[], 0.042, LookbackWindow::OneYear);
//! println!("Win rate: {}%", metrics.win_rate);
//! for warning in &report.warnings {
//!     println!("warning: {warning}");
//! }
//! # Ok::<(), folio_core::Error>(())
//! ```

pub mod cache;
pub mod classify;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod metrics;
pub mod portfolio;
pub mod series;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use types::{
    ApiResponse, AssetClass, HistoricalData, LookbackWindow, MetricsBundle, MetricsSource,
    Position, PricePoint, ValuePoint,
};

// Re-export main functionality
pub use cache::{Cache, TtlCache};
pub use classify::{classify, is_cash_equivalent, separate_positions, Classification};
pub use config::EngineConfig;
pub use engine::{compute_metrics, resolve_risk_free_rate, MetricsEngine, MetricsOutcome};
pub use fetch::{
    fetch_benchmark, gather_historical, gather_inputs, CachedSource, HistoricalSource, HistoryRequest,
};
pub use metrics::Calculator;
pub use portfolio::{aggregate, PortfolioSnapshot, PortfolioSummary, SnapshotStore};
pub use series::align;
pub use validation::{PositionStatus, Severity, ValidationReport, Validator};

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
