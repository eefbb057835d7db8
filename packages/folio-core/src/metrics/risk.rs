//! Volatility, drawdown and tail-risk measures.

use super::stats::{mean, sample_std_dev};
use super::Calculator;
use serde::{Deserialize, Serialize};

impl Calculator {
    /// Annualized volatility: sample standard deviation of period returns times
    /// the square root of periods per year. Fewer than two returns gives 0.
    pub fn volatility(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        sample_std_dev(returns) * self.sqrt_periods()
    }

    /// Annualized standard deviation of the returns below `threshold`.
    ///
    /// Fewer than two downside returns gives 0.
    pub fn downside_deviation(&self, returns: &[f64], threshold: f64) -> f64 {
        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < threshold).collect();
        if downside.len() < 2 {
            return 0.0;
        }
        sample_std_dev(&downside) * self.sqrt_periods()
    }

    /// Parametric Value at Risk in currency units.
    ///
    /// `z(confidence) * portfolio_value * daily_std_dev`, with z taken from the
    /// enumerated table (unlisted levels use the default z-score).
    pub fn value_at_risk(&self, portfolio_value: f64, daily_std_dev: f64, confidence: f64) -> f64 {
        self.z_score(confidence) * portfolio_value * daily_std_dev
    }

    /// De-annualize a volatility back to a per-period standard deviation.
    pub fn daily_std_dev(&self, annualized_volatility: f64) -> f64 {
        annualized_volatility / self.sqrt_periods()
    }
}

/// Largest peak-to-trough decline of a value series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Drawdown {
    /// Signed decline from the running peak, always <= 0
    pub max_drawdown: f64,
    pub peak_index: usize,
    pub trough_index: usize,
    pub peak: f64,
    pub trough: f64,
}

/// Maximum drawdown with the peak and trough that produced it.
///
/// Returns `None` for fewer than two points.
pub fn max_drawdown_detail(values: &[f64]) -> Option<Drawdown> {
    if values.len() < 2 {
        return None;
    }

    let mut result = Drawdown {
        max_drawdown: 0.0,
        peak_index: 0,
        trough_index: 0,
        peak: values[0],
        trough: values[0],
    };
    let mut peak = values[0];
    let mut peak_index = 0;

    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > peak {
            peak = value;
            peak_index = i;
        }
        if peak <= 0.0 {
            continue;
        }

        let drawdown = (value - peak) / peak;
        if drawdown < result.max_drawdown {
            result = Drawdown {
                max_drawdown: drawdown,
                peak_index,
                trough_index: i,
                peak,
                trough: value,
            };
        }
    }

    Some(result)
}

/// Signed maximum drawdown (<= 0). Zero for fewer than two points or a
/// non-decreasing series.
pub fn max_drawdown(values: &[f64]) -> f64 {
    max_drawdown_detail(values)
        .map(|d| d.max_drawdown)
        .unwrap_or(0.0)
}

/// Root mean square of the percentage drawdown from the running peak.
pub fn ulcer_index(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let mut peak = values[0];
    let mut sum_squared = 0.0;
    for &value in values {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let drawdown_pct = ((value - peak) / peak) * 100.0;
            sum_squared += drawdown_pct * drawdown_pct;
        }
    }

    (sum_squared / values.len() as f64).sqrt()
}

/// Conditional VaR (expected shortfall) as a return.
///
/// Mean of the worst `floor((1 - confidence) * n)` returns. No tail
/// observations gives 0.
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);

    // Nudge so that e.g. (1 - 0.9) * 10 lands on 1, not 0.999...
    let tail_len = ((1.0 - confidence) * sorted.len() as f64 + 1e-9).floor() as usize;
    let tail = &sorted[..tail_len.min(sorted.len())];
    if tail.is_empty() {
        return 0.0;
    }

    mean(tail)
}
