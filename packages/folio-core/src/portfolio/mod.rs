//! Portfolio snapshot module.
//!
//! Provides value aggregation, position-level statistics, and snapshot persistence.

mod aggregate;
mod performance;
mod snapshot;

pub use aggregate::{
    aggregate, concentration, day_change, herfindahl_index, portfolio_value, position_weights,
    sector_allocation, total_cost, total_gain_loss, PortfolioSummary,
};
pub use performance::{
    expected_return, payoff_ratio, portfolio_beta, profit_factor, win_rate, PositionStats,
};
pub use snapshot::{PortfolioSnapshot, SnapshotStore};
