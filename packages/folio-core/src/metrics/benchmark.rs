//! Portfolio-versus-benchmark statistics.
//!
//! Both return series are truncated to their common length and paired by
//! position before any statistic is taken.

use super::stats::{correlation, is_effectively_zero, mean, sample_covariance, sample_variance};
use super::Calculator;
use crate::series::truncate_pair;

/// Beta: sample covariance with the market over sample market variance.
///
/// Fewer than two paired returns, or a flat market, gives the neutral beta 1.
pub fn beta(portfolio_returns: &[f64], market_returns: &[f64]) -> f64 {
    let (portfolio, market) = truncate_pair(portfolio_returns, market_returns);
    if portfolio.len() < 2 {
        return 1.0;
    }

    let market_variance = sample_variance(market);
    if is_effectively_zero(market_variance) {
        return 1.0;
    }
    sample_covariance(portfolio, market) / market_variance
}

/// Jensen's alpha: `Rp - (rf + beta * (Rm - rf))`, all annual.
pub fn alpha(portfolio_return: f64, beta: f64, market_return: f64, risk_free_rate: f64) -> f64 {
    portfolio_return - (risk_free_rate + beta * (market_return - risk_free_rate))
}

/// Squared Pearson correlation, always within [0, 1].
pub fn r_squared(portfolio_returns: &[f64], market_returns: &[f64]) -> f64 {
    let r = correlation(portfolio_returns, market_returns);
    (r * r).clamp(0.0, 1.0)
}

impl Calculator {
    /// Annualized standard deviation of the paired return differences.
    pub fn tracking_error(&self, portfolio_returns: &[f64], benchmark_returns: &[f64]) -> f64 {
        self.volatility(&active_returns(portfolio_returns, benchmark_returns))
    }

    /// Annualized mean active return over tracking error. Zero tracking error gives 0.
    pub fn information_ratio(&self, portfolio_returns: &[f64], benchmark_returns: &[f64]) -> f64 {
        let active = active_returns(portfolio_returns, benchmark_returns);
        if active.len() < 2 {
            return 0.0;
        }

        let tracking_error = self.volatility(&active);
        if is_effectively_zero(tracking_error) {
            return 0.0;
        }
        (mean(&active) * self.periods_per_year) / tracking_error
    }
}

fn active_returns(portfolio_returns: &[f64], benchmark_returns: &[f64]) -> Vec<f64> {
    let (portfolio, benchmark) = truncate_pair(portfolio_returns, benchmark_returns);
    portfolio
        .iter()
        .zip(benchmark)
        .map(|(p, b)| p - b)
        .collect()
}
