//! Risk and performance statistics.
//!
//! Formulas that annualize or need the VaR z-score table are methods on
//! [`Calculator`], which carries those constants from [`EngineConfig`]. The
//! rest are free functions of their inputs.
//!
//! Degenerate inputs (too few observations, zero variance, no losses) resolve
//! to a documented default per formula; nothing here divides by zero.

mod benchmark;
mod ratios;
mod risk;
mod stats;

pub use benchmark::{alpha, beta, r_squared};
pub use ratios::{cagr, calmar_ratio, geometric_mean, omega_ratio, treynor_ratio};
pub use risk::{
    conditional_value_at_risk, max_drawdown, max_drawdown_detail, ulcer_index, Drawdown,
};
pub use stats::{
    correlation, is_effectively_zero, mean, sample_covariance, sample_std_dev, sample_variance,
    CorrelationMatrix, ZERO_TOLERANCE,
};

use crate::config::{EngineConfig, ZScoreTable, DEFAULT_Z_SCORE, TRADING_DAYS_PER_YEAR};

/// Annualizing metric calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculator {
    periods_per_year: f64,
    z_scores: ZScoreTable,
    default_z_score: f64,
}

impl Calculator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            periods_per_year: config.trading_days_per_year,
            z_scores: config.z_scores.clone(),
            default_z_score: config.default_z_score,
        }
    }

    /// Calculator for a different observation frequency (52 for weekly, ...).
    pub fn with_periods_per_year(mut self, periods_per_year: f64) -> Self {
        self.periods_per_year = periods_per_year;
        self
    }

    pub fn periods_per_year(&self) -> f64 {
        self.periods_per_year
    }

    /// z-score for a one-sided confidence level, falling back to the default.
    pub fn z_score(&self, confidence: f64) -> f64 {
        self.z_scores
            .lookup(confidence)
            .unwrap_or(self.default_z_score)
    }

    fn sqrt_periods(&self) -> f64 {
        self.periods_per_year.sqrt()
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self {
            periods_per_year: TRADING_DAYS_PER_YEAR,
            z_scores: ZScoreTable::default(),
            default_z_score: DEFAULT_Z_SCORE,
        }
    }
}
