//! Descriptive statistics shared by the metric formulas.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dispersion at or below this level is treated as exactly zero.
///
/// A constant series can leave a residue of ~1e-19 after subtracting its
/// floating-point mean; that residue must not turn a degenerate ratio into a
/// huge finite number.
pub const ZERO_TOLERANCE: f64 = 1e-12;

pub fn is_effectively_zero(x: f64) -> bool {
    x.abs() <= ZERO_TOLERANCE
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator); 0 for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn sample_std_dev(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Sample covariance over the common prefix of `a` and `b`.
pub fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (mean_a, mean_b) = (mean(a), mean(b));

    a.iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Pearson correlation over the common prefix; 0 when either side has no
/// dispersion or fewer than two observations.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (mean_a, mean_b) = (mean(a), mean(b));

    let mut numerator = 0.0;
    let mut sum_a_sq = 0.0;
    let mut sum_b_sq = 0.0;
    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        numerator += da * db;
        sum_a_sq += da * da;
        sum_b_sq += db * db;
    }

    let denominator = (sum_a_sq * sum_b_sq).sqrt();
    if is_effectively_zero(denominator) {
        0.0
    } else {
        (numerator / denominator).clamp(-1.0, 1.0)
    }
}

/// Pairwise correlations between ticker return series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    /// Row-major, `matrix[i][j]` correlates `tickers[i]` with `tickers[j]`
    pub matrix: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn from_returns(returns: &BTreeMap<String, Vec<f64>>) -> Self {
        let tickers: Vec<String> = returns.keys().cloned().collect();
        let matrix = returns
            .values()
            .map(|row| returns.values().map(|col| correlation(row, col)).collect())
            .collect();

        Self { tickers, matrix }
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        Some(self.matrix[i][j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_abs_diff_eq!(sample_variance(&values), 32.0 / 7.0, epsilon = 1e-12);
        assert_eq!(sample_variance(&[1.0]), 0.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_covariance_uses_common_prefix() {
        let a = [1.0, 2.0, 3.0, 100.0];
        let b = [2.0, 4.0, 6.0];
        assert_abs_diff_eq!(sample_covariance(&a, &b), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_correlation_bounds() {
        let a = [0.01, -0.02, 0.03, 0.0, 0.015];
        let b: Vec<f64> = a.iter().map(|x| x * 3.0 + 0.001).collect();
        let c: Vec<f64> = a.iter().map(|x| -x).collect();

        assert_abs_diff_eq!(correlation(&a, &b), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(correlation(&a, &c), -1.0, epsilon = 1e-12);
        assert_eq!(correlation(&a, &[0.01; 5]), 0.0);
        assert_eq!(correlation(&[0.01], &[0.02]), 0.0);
    }

    #[test]
    fn test_correlation_matrix() {
        let mut returns = BTreeMap::new();
        returns.insert("AAA".to_string(), vec![0.01, 0.02, -0.01]);
        returns.insert("BBB".to_string(), vec![-0.01, -0.02, 0.01]);

        let matrix = CorrelationMatrix::from_returns(&returns);
        assert_eq!(matrix.tickers, vec!["AAA", "BBB"]);
        assert_abs_diff_eq!(matrix.get("AAA", "AAA").unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(matrix.get("AAA", "BBB").unwrap(), -1.0, epsilon = 1e-12);
        assert!(matrix.get("AAA", "CCC").is_none());
    }
}
