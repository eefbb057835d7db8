//! Data-quality checks.
//!
//! All checks are advisory: they read their inputs, never modify them, and
//! report through a [`ValidationReport`] instead of failing. Errors and warnings
//! stay distinct even though a caller may choose to show them the same way.

use crate::config::EngineConfig;
use crate::types::{HistoricalData, LookbackWindow, MetricsBundle, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Plausible range for one metric. Values outside it are flagged, not corrected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    pub metric: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

const fn range(metric: &'static str, min: Option<f64>, max: Option<f64>) -> MetricRange {
    MetricRange { metric, min, max }
}

/// Expected domain of each range-checked metric.
pub const METRIC_RANGES: &[MetricRange] = &[
    range("alpha", Some(-1.0), Some(1.0)),
    range("sharpe", Some(-5.0), Some(10.0)),
    range("sortino", Some(-5.0), Some(10.0)),
    range("beta", Some(-2.0), Some(5.0)),
    range("max_drawdown", None, Some(0.99)),
    range("volatility", Some(0.0), Some(2.0)),
    range("information_ratio", Some(-5.0), Some(5.0)),
    range("treynor", Some(-1.0), Some(1.0)),
    range("calmar", Some(-10.0), Some(10.0)),
    range("omega", Some(0.0), Some(100.0)),
    range("r_squared", Some(0.0), Some(1.0)),
    range("win_rate", Some(0.0), Some(100.0)),
    range("profit_factor", Some(0.0), Some(1000.0)),
];

/// Returns beyond these percentages suggest bad price data.
const EXTREME_GAIN_PCT: f64 = 1000.0;
const EXTREME_LOSS_PCT: f64 = -99.0;

/// Overall outcome of a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// Coverage of one ticker's history relative to the lookback window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TickerCoverage {
    pub points: usize,
    pub expected: usize,
    /// Percentage of expected trading days present
    pub completeness: f64,
    pub is_complete: bool,
}

/// Outcome of checking a single position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PositionStatus {
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Findings from one or more checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Names of metrics that raised a finding
    pub flagged: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ticker_status: BTreeMap<String, TickerCoverage>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub position_status: BTreeMap<String, PositionStatus>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            is_valid: true,
            warnings: Vec::new(),
            errors: Vec::new(),
            flagged: BTreeSet::new(),
            ticker_status: BTreeMap::new(),
            position_status: BTreeMap::new(),
        }
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(message.into());
    }

    pub fn flag(&mut self, metric: &str) {
        self.flagged.insert(metric.to_string());
    }

    /// Fold another report's findings into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.is_valid &= other.is_valid;
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
        self.flagged.extend(other.flagged);
        self.ticker_status.extend(other.ticker_status);
        self.position_status.extend(other.position_status);
    }

    pub fn severity(&self) -> Severity {
        if !self.errors.is_empty() {
            Severity::Error
        } else if !self.warnings.is_empty() {
            Severity::Warning
        } else {
            Severity::Success
        }
    }
}

/// Threshold-driven validator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validator {
    error_ratio: f64,
    warning_ratio: f64,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Validator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            error_ratio: config.completeness_error_ratio,
            warning_ratio: config.completeness_warning_ratio,
        }
    }

    /// Compare each ticker's usable point count with the window's expected
    /// trading days.
    ///
    /// Below the error ratio (50%) is an error, below the warning ratio (90%)
    /// a warning.
    pub fn check_historical(
        &self,
        historical: &HistoricalData,
        window: LookbackWindow,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        if historical.is_empty() {
            report.error("No historical data available");
            return report;
        }

        let expected = window.expected_trading_days();
        for (ticker, series) in historical {
            let points = series.iter().filter(|p| p.is_usable()).count();
            let ratio = points as f64 / expected as f64;
            let completeness = ratio * 100.0;

            report.ticker_status.insert(
                ticker.clone(),
                TickerCoverage {
                    points,
                    expected,
                    completeness,
                    is_complete: ratio >= self.warning_ratio,
                },
            );

            if ratio < self.error_ratio {
                report.error(format!(
                    "{ticker}: Only {points}/{expected} data points ({completeness:.0}%) - insufficient data"
                ));
            } else if ratio < self.warning_ratio {
                report.warn(format!(
                    "{ticker}: {points}/{expected} data points ({completeness:.0}%) - calculations may be less accurate"
                ));
            }
        }

        report
    }

    /// Check a whole snapshot. An empty snapshot is only a warning.
    pub fn check_positions(&self, positions: &[Position]) -> ValidationReport {
        let mut report = ValidationReport::new();
        if positions.is_empty() {
            report.warn("No positions to analyze");
            return report;
        }

        for position in positions {
            let checked = self.check_position(position);
            report.position_status.insert(
                position.ticker.trim().to_string(),
                PositionStatus {
                    is_valid: checked.is_valid,
                    warnings: checked.warnings.clone(),
                    errors: checked.errors.clone(),
                },
            );
            report.merge(checked);
        }
        report
    }

    /// Check one position for values that make its metrics meaningless.
    pub fn check_position(&self, position: &Position) -> ValidationReport {
        let mut report = ValidationReport::new();
        let ticker = position.ticker.trim();

        if ticker.is_empty() {
            report.error("Position missing ticker symbol");
        }
        if !(position.shares > 0.0) {
            report.error(format!("{ticker}: Invalid shares amount ({})", position.shares));
        }
        if !(position.cost_basis > 0.0) {
            report.warn(format!(
                "{ticker}: Cost basis is {} - may be invalid",
                position.cost_basis
            ));
        }
        if !(position.current_price > 0.0) {
            report.error(format!(
                "{ticker}: Current price is {} - unable to calculate metrics",
                position.current_price
            ));
        }

        if position.current_price > 0.0 && position.cost_basis > 0.0 {
            let return_pct = position.return_ratio() * 100.0;
            if return_pct > EXTREME_GAIN_PCT {
                report.warn(format!(
                    "{ticker}: Extreme gain of {return_pct:.0}% - verify prices"
                ));
            } else if return_pct < EXTREME_LOSS_PCT {
                report.warn(format!(
                    "{ticker}: Extreme loss of {return_pct:.0}% - verify prices"
                ));
            }
        }

        report
    }

    /// Check computed metrics against [`METRIC_RANGES`] and the composite rules.
    ///
    /// NaN is an error for any metric; infinity and out-of-range values are
    /// warnings.
    pub fn check_metrics(&self, metrics: &MetricsBundle) -> ValidationReport {
        let mut report = ValidationReport::new();

        for (name, value) in metrics.named_values() {
            if value.is_nan() {
                report.error(format!("{name} is invalid or missing"));
                report.flag(name);
                continue;
            }

            let Some(range) = METRIC_RANGES.iter().find(|r| r.metric == name) else {
                continue;
            };

            let mut flagged = false;
            if value.is_infinite() {
                report.warn(format!(
                    "{name} is infinite - this may indicate division by zero"
                ));
                flagged = true;
            }
            if let Some(max) = range.max.filter(|max| value > *max) {
                report.warn(format!(
                    "{name} ({value:.2}) exceeds expected maximum ({max})"
                ));
                flagged = true;
            }
            if let Some(min) = range.min.filter(|min| value < *min) {
                report.warn(format!(
                    "{name} ({value:.2}) is below expected minimum ({min})"
                ));
                flagged = true;
            }
            if flagged {
                report.flag(name);
            }
        }

        if metrics.sharpe > 5.0 {
            report.warn("Sharpe ratio > 5 is exceptionally high - verify calculations");
        }
        if metrics.max_drawdown > 0.8 {
            report.warn("Maximum drawdown > 80% indicates severe losses");
        }
        if metrics.volatility > 1.0 {
            report.warn("Volatility > 100% is extremely high - verify data quality");
        }
        if metrics.alpha.abs() > 0.5 {
            report.warn(format!(
                "Alpha of {:.1}% is unusually high",
                metrics.alpha * 100.0
            ));
        }

        report
    }
}

/// [`Validator::check_historical`] with default thresholds.
pub fn validate_historical(historical: &HistoricalData, window: LookbackWindow) -> ValidationReport {
    Validator::default().check_historical(historical, window)
}

/// [`Validator::check_positions`] with default thresholds.
pub fn validate_positions(positions: &[Position]) -> ValidationReport {
    Validator::default().check_positions(positions)
}

/// [`Validator::check_metrics`] with default thresholds.
pub fn validate_metrics(metrics: &MetricsBundle) -> ValidationReport {
    Validator::default().check_metrics(metrics)
}
