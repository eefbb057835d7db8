//! The metrics pipeline.
//!
//! Classifier, aggregator, aligner, calculator and validator run in order on
//! every call. [`MetricsEngine`] adds a one-entry memo keyed on the five inputs
//! so callers can ask again without recomputing.

use crate::classify::separate_positions;
use crate::config::{EngineConfig, DEFAULT_RISK_FREE_RATE};
use crate::metrics::{
    alpha, beta, calmar_ratio, conditional_value_at_risk, max_drawdown, omega_ratio, r_squared,
    treynor_ratio, ulcer_index, Calculator,
};
use crate::portfolio::{aggregate, portfolio_beta, PortfolioSummary, PositionStats};
use crate::series;
use crate::types::{
    HistoricalData, LookbackWindow, MetricsBundle, MetricsSource, Position, PricePoint,
    ValuePoint,
};
use crate::validation::{ValidationReport, Validator};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

const CASH_ONLY: &str =
    "Portfolio contains only cash equivalents - risk metrics are not applicable";
const HISTORY_UNAVAILABLE: &str = "Historical data unavailable - using neutral metrics";
const BENCHMARK_UNAVAILABLE: &str =
    "Benchmark data unavailable - benchmark-relative metrics use defaults";

/// Metrics plus the findings gathered while computing them.
pub type MetricsOutcome = (MetricsBundle, ValidationReport);

/// Compute metrics with the default configuration.
pub fn compute_metrics(
    positions: &[Position],
    historical: &HistoricalData,
    benchmark: &[PricePoint],
    risk_free_rate: f64,
    window: LookbackWindow,
) -> MetricsOutcome {
    MetricsEngine::default().evaluate(positions, historical, benchmark, risk_free_rate, window)
}

/// Use `rate` if it is a finite number, otherwise the 0.042 fallback.
pub fn resolve_risk_free_rate(rate: Option<f64>) -> f64 {
    resolve_rate(rate, DEFAULT_RISK_FREE_RATE)
}

fn resolve_rate(rate: Option<f64>, fallback: f64) -> f64 {
    match rate {
        Some(rate) if rate.is_finite() => rate,
        Some(rate) => {
            warn!(rate, fallback, "unusable risk-free rate, using fallback");
            fallback
        }
        None => {
            debug!(fallback, "no risk-free rate supplied, using fallback");
            fallback
        }
    }
}

/// Configured pipeline with a memo of the last result.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    config: EngineConfig,
    calculator: Calculator,
    validator: Validator,
    memo: Option<(MemoKey, MetricsOutcome)>,
}

/// The inputs of the memoized call. The digest only short-circuits the
/// comparison; a hit requires the stored inputs to be equal.
#[derive(Debug, Clone)]
struct MemoKey {
    digest: u64,
    positions: Vec<Position>,
    historical: HistoricalData,
    benchmark: Vec<PricePoint>,
    risk_free_rate: u64,
    window: LookbackWindow,
}

impl MemoKey {
    fn new(
        positions: &[Position],
        historical: &HistoricalData,
        benchmark: &[PricePoint],
        risk_free_rate: f64,
        window: LookbackWindow,
    ) -> Self {
        Self {
            digest: fingerprint(positions, historical, benchmark, risk_free_rate, window),
            positions: positions.to_vec(),
            historical: historical.clone(),
            benchmark: benchmark.to_vec(),
            risk_free_rate: risk_free_rate.to_bits(),
            window,
        }
    }

    fn matches(
        &self,
        positions: &[Position],
        historical: &HistoricalData,
        benchmark: &[PricePoint],
        risk_free_rate: f64,
        window: LookbackWindow,
    ) -> bool {
        self.digest == fingerprint(positions, historical, benchmark, risk_free_rate, window)
            && self.risk_free_rate == risk_free_rate.to_bits()
            && self.window == window
            && self.positions.as_slice() == positions
            && self.benchmark.as_slice() == benchmark
            && self.historical == *historical
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl MetricsEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            calculator: Calculator::new(&config),
            validator: Validator::new(&config),
            config,
            memo: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn risk_free_rate(&self, rate: Option<f64>) -> f64 {
        resolve_rate(rate, self.config.default_risk_free_rate)
    }

    /// Memoized [`evaluate`](Self::evaluate).
    ///
    /// The previous outcome is returned as-is when all five inputs match the
    /// last call.
    pub fn compute(
        &mut self,
        positions: &[Position],
        historical: &HistoricalData,
        benchmark: &[PricePoint],
        risk_free_rate: f64,
        window: LookbackWindow,
    ) -> MetricsOutcome {
        if let Some((key, outcome)) = &self.memo {
            if key.matches(positions, historical, benchmark, risk_free_rate, window) {
                debug!(digest = key.digest, "metrics memo hit");
                return outcome.clone();
            }
        }

        let outcome = self.evaluate(positions, historical, benchmark, risk_free_rate, window);
        let key = MemoKey::new(positions, historical, benchmark, risk_free_rate, window);
        self.memo = Some((key, outcome.clone()));
        outcome
    }

    /// Whether the memo currently holds the outcome for these inputs.
    pub fn is_memoized(
        &self,
        positions: &[Position],
        historical: &HistoricalData,
        benchmark: &[PricePoint],
        risk_free_rate: f64,
        window: LookbackWindow,
    ) -> bool {
        matches!(
            &self.memo,
            Some((key, _)) if key.matches(positions, historical, benchmark, risk_free_rate, window)
        )
    }

    pub fn clear_memo(&mut self) {
        self.memo = None;
    }

    /// Run the full pipeline from scratch.
    pub fn evaluate(
        &self,
        positions: &[Position],
        historical: &HistoricalData,
        benchmark: &[PricePoint],
        risk_free_rate: f64,
        window: LookbackWindow,
    ) -> MetricsOutcome {
        let risk_free_rate = self.risk_free_rate(Some(risk_free_rate));
        let summary = aggregate(positions);
        let (equity, cash) = separate_positions(&summary.positions);
        debug!(
            equity = equity.len(),
            cash = cash.len(),
            total_value = summary.total_value,
            "aggregated snapshot"
        );

        let mut report = self.validator.check_positions(&summary.positions);
        if !equity.is_empty() {
            report.merge(self.validator.check_historical(historical, window));
        }

        let mut metrics = if equity.is_empty() {
            if !positions.is_empty() {
                report.warn(CASH_ONLY);
            }
            self.neutral(&equity, "no equity positions")
        } else if historical.is_empty() {
            report.warn(HISTORY_UNAVAILABLE);
            self.neutral(&equity, "no historical data")
        } else {
            let aligned = series::align(historical, &equity);
            debug!(points = aligned.len(), "aligned portfolio history");

            if aligned.len() < self.config.min_aligned_points {
                report.warn(format!(
                    "Insufficient aligned history ({} points, need {}) - using neutral metrics",
                    aligned.len(),
                    self.config.min_aligned_points
                ));
                self.neutral(&equity, "aligned history too short")
            } else {
                let benchmark_returns = series::price_returns(benchmark);
                if benchmark_returns.len() < 2 {
                    report.warn(BENCHMARK_UNAVAILABLE);
                }
                self.historical(&summary, &equity, &aligned, &benchmark_returns, risk_free_rate)
            }
        };

        let stats = PositionStats::from_positions(&equity);
        metrics.concentration = summary.concentration;
        metrics.herfindahl_index = summary.herfindahl_index;
        metrics.win_rate = stats.win_rate;
        metrics.payoff_ratio = stats.payoff_ratio;
        metrics.profit_factor = stats.profit_factor;

        report.merge(self.validator.check_metrics(&metrics));
        (metrics, report)
    }

    /// Neutral bundle carrying the weighted market-data beta of `equity`.
    fn neutral(&self, equity: &[Position], reason: &str) -> MetricsBundle {
        debug!(reason, "using neutral metrics");
        MetricsBundle {
            beta: portfolio_beta(equity),
            ..MetricsBundle::neutral()
        }
    }

    fn historical(
        &self,
        summary: &PortfolioSummary,
        equity: &[Position],
        aligned: &[ValuePoint],
        benchmark_returns: &[f64],
        risk_free_rate: f64,
    ) -> MetricsBundle {
        let calc = &self.calculator;
        let values = series::values(aligned);
        let returns = series::returns(&values);
        let has_benchmark = benchmark_returns.len() >= 2;

        let volatility = calc.volatility(&returns);
        let annualized_return = calc.annualized_return(&returns);
        let drawdown = max_drawdown(&values);

        let (beta, benchmark_annualized_return) = if has_benchmark {
            (
                beta(&returns, benchmark_returns),
                calc.annualized_return(benchmark_returns),
            )
        } else {
            (portfolio_beta(equity), 0.0)
        };

        let var = calc.value_at_risk(
            summary.total_value,
            calc.daily_std_dev(volatility),
            self.config.var_confidence,
        );

        let mut metrics = MetricsBundle {
            source: MetricsSource::Historical,
            sharpe: calc.sharpe_ratio(&returns, risk_free_rate),
            sortino: calc.sortino_ratio(&returns, risk_free_rate),
            beta,
            volatility,
            downside_deviation: calc.downside_deviation(&returns, 0.0),
            max_drawdown: drawdown.abs(),
            annualized_return,
            var,
            cvar: conditional_value_at_risk(&returns, self.config.var_confidence),
            treynor: if annualized_return.is_finite() {
                treynor_ratio(annualized_return, beta, risk_free_rate)
            } else {
                0.0
            },
            calmar: if annualized_return.is_finite() {
                calmar_ratio(annualized_return, drawdown)
            } else {
                0.0
            },
            ulcer_index: ulcer_index(&values),
            omega: omega_ratio(&returns, 0.0),
            ..MetricsBundle::neutral()
        };

        if has_benchmark {
            // Overflowed returns would make alpha inf - inf.
            if annualized_return.is_finite() && benchmark_annualized_return.is_finite() {
                metrics.alpha = alpha(
                    annualized_return,
                    beta,
                    benchmark_annualized_return,
                    risk_free_rate,
                );
            }
            metrics.r_squared = r_squared(&returns, benchmark_returns);
            metrics.tracking_error = calc.tracking_error(&returns, benchmark_returns);
            metrics.information_ratio = calc.information_ratio(&returns, benchmark_returns);
            metrics.benchmark_annualized_return = benchmark_annualized_return;
        }

        debug!(
            returns = returns.len(),
            volatility, beta, "computed historical metrics"
        );
        metrics
    }
}

fn fingerprint(
    positions: &[Position],
    historical: &HistoricalData,
    benchmark: &[PricePoint],
    risk_free_rate: f64,
    window: LookbackWindow,
) -> u64 {
    let mut hasher = DefaultHasher::new();

    positions.len().hash(&mut hasher);
    for p in positions {
        p.ticker.hash(&mut hasher);
        p.shares.to_bits().hash(&mut hasher);
        p.cost_basis.to_bits().hash(&mut hasher);
        p.current_price.to_bits().hash(&mut hasher);
        p.day_change.to_bits().hash(&mut hasher);
        p.sector.hash(&mut hasher);
        p.beta.map(f64::to_bits).hash(&mut hasher);
    }

    historical.len().hash(&mut hasher);
    for (ticker, series) in historical {
        ticker.hash(&mut hasher);
        hash_prices(series, &mut hasher);
    }
    hash_prices(benchmark, &mut hasher);

    risk_free_rate.to_bits().hash(&mut hasher);
    window.hash(&mut hasher);
    hasher.finish()
}

fn hash_prices(points: &[PricePoint], hasher: &mut DefaultHasher) {
    points.len().hash(hasher);
    for point in points {
        point.date.hash(hasher);
        point.close.to_bits().hash(hasher);
    }
}
