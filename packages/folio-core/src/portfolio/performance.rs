//! Position-scope performance statistics.
//!
//! These work on the current snapshot only (no history). Callers choosing an
//! equity-only scope pass the equity subset from
//! [`separate_positions`](crate::classify::separate_positions).

use crate::types::Position;
use serde::{Deserialize, Serialize};

/// Win/loss statistics over a set of positions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PositionStats {
    /// Percentage of positions trading above cost
    pub win_rate: f64,
    pub payoff_ratio: f64,
    pub profit_factor: f64,
}

impl PositionStats {
    pub fn from_positions(positions: &[Position]) -> Self {
        Self {
            win_rate: win_rate(positions),
            payoff_ratio: payoff_ratio(positions),
            profit_factor: profit_factor(positions),
        }
    }
}

/// Percentage of positions whose current price exceeds the cost basis.
pub fn win_rate(positions: &[Position]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }

    let winners = positions
        .iter()
        .filter(|p| p.current_price > p.cost_basis)
        .count();

    (winners as f64 / positions.len() as f64) * 100.0
}

/// Average winner return over the absolute average loser return.
///
/// Returns 0 when there are no winners or no losers to compare against.
pub fn payoff_ratio(positions: &[Position]) -> f64 {
    let winners: Vec<f64> = positions
        .iter()
        .filter(|p| p.current_price > p.cost_basis)
        .map(|p| p.return_ratio())
        .collect();
    let losers: Vec<f64> = positions
        .iter()
        .filter(|p| p.current_price < p.cost_basis)
        .map(|p| p.return_ratio())
        .collect();

    if winners.is_empty() || losers.is_empty() {
        return 0.0;
    }

    let avg_win = winners.iter().sum::<f64>() / winners.len() as f64;
    let avg_loss = (losers.iter().sum::<f64>() / losers.len() as f64).abs();

    if avg_loss == 0.0 {
        0.0
    } else {
        avg_win / avg_loss
    }
}

/// Gross dollar profit over gross dollar loss.
///
/// No losses gives `+inf` when there is any profit, otherwise 0.
pub fn profit_factor(positions: &[Position]) -> f64 {
    let (gross_profit, gross_loss) =
        positions
            .iter()
            .fold((0.0, 0.0), |(profit, loss), p| match p.gain_loss() {
                g if g > 0.0 => (profit + g, loss),
                g => (profit, loss + g.abs()),
            });

    if gross_loss == 0.0 {
        if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        gross_profit / gross_loss
    }
}

/// Value-weighted unrealized return of the snapshot, as a decimal.
pub fn expected_return(positions: &[Position]) -> f64 {
    let total_value: f64 = positions.iter().map(|p| p.market_value()).sum();
    if total_value <= 0.0 {
        return 0.0;
    }

    positions
        .iter()
        .map(|p| (p.market_value() / total_value) * p.return_ratio())
        .sum()
}

/// Value-weighted beta from per-position market-data betas.
///
/// Missing betas count as 1; classified cash equivalents carry 0. An empty or
/// zero-value snapshot is market-neutral at 1.
pub fn portfolio_beta(positions: &[Position]) -> f64 {
    let total_value: f64 = positions.iter().map(|p| p.market_value()).sum();
    if total_value <= 0.0 {
        return 1.0;
    }

    positions
        .iter()
        .map(|p| (p.market_value() / total_value) * p.beta.unwrap_or(1.0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn position(ticker: &str, shares: f64, cost: f64, price: f64) -> Position {
        Position::new(ticker, shares, cost, price).unwrap()
    }

    #[test]
    fn test_single_winner() {
        let positions = vec![position("AAPL", 10.0, 100.0, 150.0)];

        assert_eq!(win_rate(&positions), 100.0);
        assert_eq!(payoff_ratio(&positions), 0.0);
        assert!(profit_factor(&positions).is_infinite());
    }

    #[test]
    fn test_mixed_positions() {
        let positions = vec![
            position("AAPL", 10.0, 100.0, 150.0), // +50%, +$500
            position("MSFT", 10.0, 100.0, 120.0), // +20%, +$200
            position("GOOGL", 5.0, 100.0, 80.0),  // -20%, -$100
            position("TSLA", 1.0, 100.0, 100.0),  // flat
        ];

        assert_eq!(win_rate(&positions), 50.0);
        // avg win 35% / avg loss 20%
        assert_abs_diff_eq!(payoff_ratio(&positions), 1.75, epsilon = 1e-12);
        assert_abs_diff_eq!(profit_factor(&positions), 7.0, epsilon = 1e-12);

        let stats = PositionStats::from_positions(&positions);
        assert_eq!(stats.win_rate, 50.0);
    }

    #[test]
    fn test_empty_and_flat() {
        assert_eq!(win_rate(&[]), 0.0);
        assert_eq!(payoff_ratio(&[]), 0.0);
        assert_eq!(profit_factor(&[]), 0.0);

        let flat = vec![position("AAPL", 10.0, 100.0, 100.0)];
        assert_eq!(profit_factor(&flat), 0.0);
    }

    #[test]
    fn test_expected_return() {
        let positions = vec![
            position("AAPL", 10.0, 100.0, 150.0), // $1500, +50%
            position("GOOGL", 5.0, 100.0, 100.0), // $500, 0%
        ];

        assert_abs_diff_eq!(expected_return(&positions), 0.375, epsilon = 1e-12);
        assert_eq!(expected_return(&[]), 0.0);
    }

    #[test]
    fn test_portfolio_beta() {
        let positions = vec![
            position("AAPL", 10.0, 100.0, 100.0).with_beta(1.5),
            position("MSFT", 10.0, 100.0, 100.0),
            position("SPAXX", 2000.0, 1.0, 1.0).with_beta(0.8),
        ];

        // 0.25 * 1.5 + 0.25 * 1.0 + 0.5 * 0.0
        assert_abs_diff_eq!(portfolio_beta(&positions), 0.625, epsilon = 1e-12);
        assert_eq!(portfolio_beta(&[]), 1.0);
    }
}
