//! Portfolio-level aggregates over one position snapshot.
//!
//! Every function here is total: an empty slice yields zero-valued results and a
//! zero total value yields zero weights instead of dividing through.

use crate::types::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of holdings counted by [`concentration`].
const TOP_HOLDINGS: usize = 3;

/// Aggregated view of a position snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSummary {
    /// Total market value of all positions
    pub total_value: f64,
    /// Total cost basis of all positions
    pub total_cost: f64,
    /// Total unrealized gain/loss in dollars
    pub total_gain_loss: f64,
    /// Total unrealized gain/loss percentage
    pub total_gain_loss_percent: f64,
    /// Dollar change since the previous close
    pub day_change: f64,
    /// Market value of non-cash holdings
    pub equity_value: f64,
    /// Market value of cash equivalents
    pub cash_value: f64,
    pub position_count: usize,
    pub positions_in_profit: usize,
    pub positions_in_loss: usize,
    /// Positions with classification and weights refreshed
    pub positions: Vec<Position>,
    /// Weight percentage per sector label
    pub sector_allocation: BTreeMap<String, f64>,
    /// Combined weight of the three largest holdings
    pub concentration: f64,
    pub herfindahl_index: f64,
    /// Tickers of the three largest holdings, largest first
    pub top_holdings: Vec<String>,
}

/// Classify, weight and summarize a snapshot.
pub fn aggregate(positions: &[Position]) -> PortfolioSummary {
    let weighted = position_weights(positions);
    let total_value = portfolio_value(&weighted);
    let total_cost = total_cost(&weighted);
    let total_gain_loss = total_gain_loss(&weighted);

    let total_gain_loss_percent = if total_cost > 0.0 {
        (total_gain_loss / total_cost) * 100.0
    } else {
        0.0
    };

    let (cash, equity): (Vec<&Position>, Vec<&Position>) =
        weighted.iter().partition(|p| p.is_cash_equivalent);

    let weights: Vec<f64> = weighted.iter().map(|p| p.weight).collect();
    let top_holdings = ranked_by_weight(&weighted)
        .into_iter()
        .take(TOP_HOLDINGS)
        .map(|p| p.ticker.clone())
        .collect();

    PortfolioSummary {
        total_value,
        total_cost,
        total_gain_loss,
        total_gain_loss_percent,
        day_change: day_change(&weighted),
        equity_value: equity.iter().map(|p| p.market_value()).sum(),
        cash_value: cash.iter().map(|p| p.market_value()).sum(),
        position_count: weighted.len(),
        positions_in_profit: weighted.iter().filter(|p| p.gain_loss() > 0.0).count(),
        positions_in_loss: weighted.iter().filter(|p| p.gain_loss() < 0.0).count(),
        sector_allocation: sector_allocation(&weighted),
        concentration: concentration(&weighted),
        herfindahl_index: herfindahl_index(&weights),
        top_holdings,
        positions: weighted,
    }
}

pub fn portfolio_value(positions: &[Position]) -> f64 {
    positions.iter().map(|p| p.market_value()).sum()
}

pub fn total_cost(positions: &[Position]) -> f64 {
    positions.iter().map(|p| p.total_cost()).sum()
}

pub fn total_gain_loss(positions: &[Position]) -> f64 {
    positions.iter().map(|p| p.gain_loss()).sum()
}

/// Dollar day change; cash equivalents contribute nothing once classified.
pub fn day_change(positions: &[Position]) -> f64 {
    positions.iter().map(|p| p.day_change * p.shares).sum()
}

/// Return the positions with classification refreshed and `weight` set to
/// `value / total * 100`, or 0 everywhere when the total value is 0.
pub fn position_weights(positions: &[Position]) -> Vec<Position> {
    let classified: Vec<Position> = positions.iter().cloned().map(Position::classified).collect();
    let total_value = portfolio_value(&classified);

    classified
        .into_iter()
        .map(|mut p| {
            p.weight = if total_value > 0.0 {
                (p.market_value() / total_value) * 100.0
            } else {
                0.0
            };
            p
        })
        .collect()
}

/// Sum weight percentages per sector label.
pub fn sector_allocation(positions: &[Position]) -> BTreeMap<String, f64> {
    let mut sectors = BTreeMap::new();
    for p in position_weights(positions) {
        *sectors.entry(p.sector_label().to_string()).or_insert(0.0) += p.weight;
    }
    sectors
}

/// Combined weight of the three largest positions.
pub fn concentration(positions: &[Position]) -> f64 {
    ranked_by_weight(&position_weights(positions))
        .into_iter()
        .take(TOP_HOLDINGS)
        .map(|p| p.weight)
        .sum()
}

/// Sum of squared fractional weights. `weights` are percentages (0-100).
///
/// n equal weights give 1/n; a single holding gives 1.
pub fn herfindahl_index(weights: &[f64]) -> f64 {
    weights.iter().map(|w| (w / 100.0).powi(2)).sum()
}

fn ranked_by_weight(positions: &[Position]) -> Vec<&Position> {
    let mut ranked: Vec<&Position> = positions.iter().collect();
    ranked.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    ranked
}
