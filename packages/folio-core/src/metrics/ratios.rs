//! Return and risk-adjusted ratio formulas.

use super::stats::{is_effectively_zero, mean, sample_std_dev};
use super::Calculator;

impl Calculator {
    /// Geometric-mean period return compounded over one year.
    pub fn annualized_return(&self, returns: &[f64]) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }
        let per_period = geometric_mean(returns);
        if per_period <= -1.0 {
            // The series lost everything at some point.
            return -1.0;
        }
        (1.0 + per_period).powf(self.periods_per_year) - 1.0
    }

    /// Sharpe ratio: `(mean * periods - rf) / (std_dev * sqrt(periods))`.
    ///
    /// `risk_free_rate` is annual. Zero volatility or fewer than two returns gives 0.
    pub fn sharpe_ratio(&self, returns: &[f64], risk_free_rate: f64) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let std_dev = sample_std_dev(returns);
        if is_effectively_zero(std_dev) {
            return 0.0;
        }
        (mean(returns) * self.periods_per_year - risk_free_rate) / (std_dev * self.sqrt_periods())
    }

    /// Sortino ratio: excess annualized mean over annualized downside deviation
    /// (threshold 0). Zero downside deviation gives 0.
    pub fn sortino_ratio(&self, returns: &[f64], risk_free_rate: f64) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let downside = self.downside_deviation(returns, 0.0);
        if is_effectively_zero(downside) {
            return 0.0;
        }
        (mean(returns) * self.periods_per_year - risk_free_rate) / downside
    }
}

/// Excess return per unit of beta. Zero beta gives 0.
pub fn treynor_ratio(portfolio_return: f64, beta: f64, risk_free_rate: f64) -> f64 {
    if beta == 0.0 {
        return 0.0;
    }
    (portfolio_return - risk_free_rate) / beta
}

/// Annualized return per unit of maximum drawdown (either sign). Zero drawdown gives 0.
pub fn calmar_ratio(annualized_return: f64, max_drawdown: f64) -> f64 {
    if max_drawdown == 0.0 {
        return 0.0;
    }
    annualized_return / max_drawdown.abs()
}

/// Sum of gains above `threshold` over the sum of shortfalls below it.
///
/// With no shortfall the ratio is `+inf` if there was any gain, otherwise 0.
pub fn omega_ratio(returns: &[f64], threshold: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let (gains, losses) = returns.iter().fold((0.0, 0.0), |(gains, losses), r| {
        let excess = r - threshold;
        if excess > 0.0 {
            (gains + excess, losses)
        } else {
            (gains, losses + excess.abs())
        }
    });

    if losses == 0.0 {
        if gains > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        gains / losses
    }
}

/// Geometric mean of period returns.
pub fn geometric_mean(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let growth = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r));
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(1.0 / returns.len() as f64) - 1.0
}

/// Compound annual growth rate between two values `years` apart.
pub fn cagr(beginning_value: f64, ending_value: f64, years: f64) -> f64 {
    if beginning_value <= 0.0 || years <= 0.0 || ending_value < 0.0 {
        return 0.0;
    }
    (ending_value / beginning_value).powf(1.0 / years) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_annualized_return() {
        let calc = Calculator::default();

        let flat: Vec<f64> = vec![0.0; 30];
        assert_eq!(calc.annualized_return(&flat), 0.0);

        let steady = vec![0.001; 10];
        assert_abs_diff_eq!(
            calc.annualized_return(&steady),
            1.001_f64.powf(252.0) - 1.0,
            epsilon = 1e-9
        );

        let mixed = [0.02, -0.01, 0.015, -0.004];
        assert_abs_diff_eq!(
            calc.annualized_return(&mixed),
            (1.0 + geometric_mean(&mixed)).powf(252.0) - 1.0,
            epsilon = 1e-12
        );

        assert_eq!(calc.annualized_return(&[]), 0.0);
        assert_eq!(calc.annualized_return(&[0.1, -1.0, 0.2]), -1.0);
    }

    #[test]
    fn test_sharpe_ratio() {
        let calc = Calculator::default();
        let returns = vec![0.01, -0.005, 0.008, -0.003, 0.012, -0.007, 0.005, 0.002];

        let expected = (mean(&returns) * 252.0 - 0.04) / (sample_std_dev(&returns) * 252.0_f64.sqrt());
        assert_abs_diff_eq!(calc.sharpe_ratio(&returns, 0.04), expected, epsilon = 1e-12);

        let losing: Vec<f64> = returns.iter().map(|r| r - 0.01).collect();
        assert!(calc.sharpe_ratio(&losing, 0.04) < 0.0);
    }

    #[test]
    fn test_zero_variance_ratios() {
        let calc = Calculator::default();
        let constant = vec![0.001; 100];

        assert_eq!(calc.sharpe_ratio(&constant, 0.04), 0.0);
        assert_eq!(calc.sortino_ratio(&constant, 0.04), 0.0);
        assert_eq!(calc.sharpe_ratio(&[0.01], 0.04), 0.0);
    }

    #[test]
    fn test_sortino_ratio() {
        let calc = Calculator::default();
        let returns = vec![0.02, -0.01, 0.015, -0.02, 0.01, -0.005, 0.012];

        let downside = calc.downside_deviation(&returns, 0.0);
        let expected = (mean(&returns) * 252.0 - 0.042) / downside;
        assert_abs_diff_eq!(calc.sortino_ratio(&returns, 0.042), expected, epsilon = 1e-12);

        // No downside at all.
        assert_eq!(calc.sortino_ratio(&[0.01, 0.02, 0.03], 0.042), 0.0);
    }

    #[test]
    fn test_treynor_and_calmar() {
        assert_abs_diff_eq!(treynor_ratio(0.12, 1.2, 0.04), 0.08 / 1.2, epsilon = 1e-12);
        assert_eq!(treynor_ratio(0.12, 0.0, 0.04), 0.0);

        assert_abs_diff_eq!(calmar_ratio(0.15, -0.3), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(calmar_ratio(0.15, 0.3), 0.5, epsilon = 1e-12);
        assert_eq!(calmar_ratio(0.15, 0.0), 0.0);
    }

    #[test]
    fn test_omega_ratio() {
        assert!(omega_ratio(&[0.01, 0.02, 0.005], 0.0).is_infinite());
        assert_eq!(omega_ratio(&[0.0, 0.0], 0.0), 0.0);
        assert_eq!(omega_ratio(&[], 0.0), 0.0);

        let omega = omega_ratio(&[0.03, -0.01, 0.01, -0.02], 0.0);
        assert!(omega.is_finite());
        assert_abs_diff_eq!(omega, 0.04 / 0.03, epsilon = 1e-12);

        // Raising the threshold turns gains into shortfalls.
        assert_abs_diff_eq!(omega_ratio(&[0.03, 0.01], 0.02), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_geometric_mean_and_cagr() {
        assert_abs_diff_eq!(geometric_mean(&[0.1, 0.1]), 0.1, epsilon = 1e-12);
        assert_eq!(geometric_mean(&[]), 0.0);

        assert_abs_diff_eq!(cagr(100.0, 121.0, 2.0), 0.1, epsilon = 1e-12);
        assert_eq!(cagr(0.0, 121.0, 2.0), 0.0);
        assert_eq!(cagr(100.0, 121.0, 0.0), 0.0);
    }
}
