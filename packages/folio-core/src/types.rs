//! Core data types for the folio metrics engine.

use crate::classify::classify;
use crate::{Error, Result};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Per-ticker historical closes, keyed by ticker symbol.
///
/// Each series is sourced independently, so lengths and date coverage may differ.
pub type HistoricalData = BTreeMap<String, Vec<PricePoint>>;

/// Broad asset category derived from a ticker symbol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    #[default]
    Equity,
    MoneyMarket,
    Treasury,
}

impl AssetClass {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::Equity => "Equity",
            AssetClass::MoneyMarket => "Money Market Fund",
            AssetClass::Treasury => "Treasury",
        }
    }

    /// Whether this class is treated as cash for risk purposes.
    pub fn is_cash_equivalent(&self) -> bool {
        !matches!(self, AssetClass::Equity)
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A holding in one portfolio snapshot.
///
/// `asset_class`, `is_cash_equivalent` and `weight` are derived fields. They are
/// refreshed by [`Position::classified`] and the aggregator, never trusted from input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Ticker symbol (uppercase)
    pub ticker: String,
    /// Number of shares held
    pub shares: f64,
    /// Average cost per share
    pub cost_basis: f64,
    /// Latest market price per share
    #[serde(default)]
    pub current_price: f64,
    /// Price change since the previous close, per share
    #[serde(default)]
    pub day_change: f64,
    /// Sector label (market data, or the cash-equivalent override)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Market-data beta, if the pricing collaborator supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(default)]
    pub asset_class: AssetClass,
    #[serde(default)]
    pub is_cash_equivalent: bool,
    /// Percentage of total portfolio value (0-100)
    #[serde(default)]
    pub weight: f64,
}

impl Position {
    /// Create a classified position, rejecting values no snapshot may hold.
    pub fn new(ticker: &str, shares: f64, cost_basis: f64, current_price: f64) -> Result<Self> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(Error::InvalidPosition("ticker is required".to_string()));
        }
        if !(shares.is_finite() && shares > 0.0) {
            return Err(Error::InvalidPosition(format!(
                "{ticker}: shares must be positive (got {shares})"
            )));
        }
        if !(cost_basis.is_finite() && cost_basis > 0.0) {
            return Err(Error::InvalidPosition(format!(
                "{ticker}: cost basis must be positive (got {cost_basis})"
            )));
        }
        if !(current_price.is_finite() && current_price >= 0.0) {
            return Err(Error::InvalidPosition(format!(
                "{ticker}: current price must be non-negative (got {current_price})"
            )));
        }

        Ok(Self {
            ticker,
            shares,
            cost_basis,
            current_price,
            day_change: 0.0,
            sector: None,
            beta: None,
            asset_class: AssetClass::Equity,
            is_cash_equivalent: false,
            weight: 0.0,
        }
        .classified())
    }

    /// Attach the per-share day change reported by market data.
    pub fn with_day_change(mut self, day_change: f64) -> Self {
        self.day_change = day_change;
        self.classified()
    }

    /// Attach the market-data sector.
    pub fn with_sector(mut self, sector: &str) -> Self {
        self.sector = Some(sector.to_string());
        self.classified()
    }

    /// Attach the market-data beta.
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self.classified()
    }

    /// Recompute every ticker-derived field.
    ///
    /// Cash equivalents get their sector overridden, their day change zeroed and
    /// their beta pinned to 0.
    pub fn classified(mut self) -> Self {
        let classification = classify(&self.ticker);
        self.asset_class = classification.asset_class;
        self.is_cash_equivalent = classification.is_cash_equivalent;
        self.sector = Some(classification.sector_label(self.sector.as_deref()));
        if self.is_cash_equivalent {
            self.day_change = 0.0;
            self.beta = Some(0.0);
        }
        self
    }

    /// Current market value (shares * current price).
    pub fn market_value(&self) -> f64 {
        self.shares * self.current_price
    }

    /// Total cost of this position.
    pub fn total_cost(&self) -> f64 {
        self.shares * self.cost_basis
    }

    /// Unrealized gain/loss in dollars.
    pub fn gain_loss(&self) -> f64 {
        (self.current_price - self.cost_basis) * self.shares
    }

    /// Unrealized return as a decimal (0.5 for +50%).
    pub fn return_ratio(&self) -> f64 {
        if self.cost_basis > 0.0 {
            (self.current_price - self.cost_basis) / self.cost_basis
        } else {
            0.0
        }
    }

    /// Sector label used for grouping.
    pub fn sector_label(&self) -> &str {
        self.sector.as_deref().unwrap_or("Unknown")
    }
}

/// A single daily close.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }

    /// Whether this close can take part in return or value computations.
    pub fn is_usable(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// One point of an aligned portfolio value series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Historical lookback window selected by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum LookbackWindow {
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "3y")]
    ThreeYears,
}

impl LookbackWindow {
    /// Number of trading days a complete series should contain.
    pub fn expected_trading_days(&self) -> usize {
        match self {
            LookbackWindow::ThreeMonths => 63,
            LookbackWindow::SixMonths => 126,
            LookbackWindow::OneYear => 252,
            LookbackWindow::ThreeYears => 756,
        }
    }

    /// Calendar months covered by the window.
    pub fn months(&self) -> u32 {
        match self {
            LookbackWindow::ThreeMonths => 3,
            LookbackWindow::SixMonths => 6,
            LookbackWindow::OneYear => 12,
            LookbackWindow::ThreeYears => 36,
        }
    }

    /// First calendar date of the window ending at `end`.
    pub fn start_date(&self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LookbackWindow::ThreeMonths => "3m",
            LookbackWindow::SixMonths => "6m",
            LookbackWindow::OneYear => "1y",
            LookbackWindow::ThreeYears => "3y",
        }
    }
}

impl fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookbackWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "3m" => Ok(LookbackWindow::ThreeMonths),
            "6m" => Ok(LookbackWindow::SixMonths),
            "1y" => Ok(LookbackWindow::OneYear),
            "3y" => Ok(LookbackWindow::ThreeYears),
            other => Err(Error::InvalidArgument(format!(
                "unknown lookback window '{other}' (expected 3m, 6m, 1y or 3y)"
            ))),
        }
    }
}

/// Where the risk figures of a [`MetricsBundle`] came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MetricsSource {
    /// Computed from the aligned historical series.
    Historical,
    /// Neutral defaults; history was missing, too short, or there were no equities.
    #[default]
    Neutral,
}

/// Risk and performance statistics for one snapshot and one historical window.
///
/// Ratios are plain numbers; volatility, drawdown, returns and alpha are decimals;
/// `win_rate`, `concentration` are percentages; `var` is in dollars.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsBundle {
    pub source: MetricsSource,
    pub sharpe: f64,
    pub sortino: f64,
    pub beta: f64,
    pub alpha: f64,
    pub r_squared: f64,
    pub information_ratio: f64,
    pub tracking_error: f64,
    pub volatility: f64,
    pub downside_deviation: f64,
    /// Drawdown magnitude, 0.25 for a 25% peak-to-trough decline
    pub max_drawdown: f64,
    pub annualized_return: f64,
    pub benchmark_annualized_return: f64,
    pub concentration: f64,
    pub herfindahl_index: f64,
    pub var: f64,
    /// Mean tail return at the VaR confidence level (negative for losses)
    pub cvar: f64,
    pub treynor: f64,
    pub calmar: f64,
    pub ulcer_index: f64,
    pub omega: f64,
    pub win_rate: f64,
    pub payoff_ratio: f64,
    pub profit_factor: f64,
}

impl MetricsBundle {
    /// Bundle with every metric at its neutral default (beta 1, everything else 0).
    pub fn neutral() -> Self {
        Self {
            source: MetricsSource::Neutral,
            sharpe: 0.0,
            sortino: 0.0,
            beta: 1.0,
            alpha: 0.0,
            r_squared: 0.0,
            information_ratio: 0.0,
            tracking_error: 0.0,
            volatility: 0.0,
            downside_deviation: 0.0,
            max_drawdown: 0.0,
            annualized_return: 0.0,
            benchmark_annualized_return: 0.0,
            concentration: 0.0,
            herfindahl_index: 0.0,
            var: 0.0,
            cvar: 0.0,
            treynor: 0.0,
            calmar: 0.0,
            ulcer_index: 0.0,
            omega: 0.0,
            win_rate: 0.0,
            payoff_ratio: 0.0,
            profit_factor: 0.0,
        }
    }

    /// Every scalar metric paired with its name, in a stable order.
    pub fn named_values(&self) -> [(&'static str, f64); 23] {
        [
            ("sharpe", self.sharpe),
            ("sortino", self.sortino),
            ("beta", self.beta),
            ("alpha", self.alpha),
            ("r_squared", self.r_squared),
            ("information_ratio", self.information_ratio),
            ("tracking_error", self.tracking_error),
            ("volatility", self.volatility),
            ("downside_deviation", self.downside_deviation),
            ("max_drawdown", self.max_drawdown),
            ("annualized_return", self.annualized_return),
            ("benchmark_annualized_return", self.benchmark_annualized_return),
            ("concentration", self.concentration),
            ("herfindahl_index", self.herfindahl_index),
            ("var", self.var),
            ("cvar", self.cvar),
            ("treynor", self.treynor),
            ("calmar", self.calmar),
            ("ulcer_index", self.ulcer_index),
            ("omega", self.omega),
            ("win_rate", self.win_rate),
            ("payoff_ratio", self.payoff_ratio),
            ("profit_factor", self.profit_factor),
        ]
    }
}

impl Default for MetricsBundle {
    fn default() -> Self {
        Self::neutral()
    }
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_new() {
        let pos = Position::new("aapl", 10.0, 100.0, 150.0).unwrap();
        assert_eq!(pos.ticker, "AAPL");
        assert_eq!(pos.market_value(), 1500.0);
        assert_eq!(pos.total_cost(), 1000.0);
        assert_eq!(pos.gain_loss(), 500.0);
        assert_eq!(pos.asset_class, AssetClass::Equity);
        assert!(!pos.is_cash_equivalent);
    }

    #[test]
    fn test_position_new_rejects_invalid_values() {
        assert!(matches!(
            Position::new("", 1.0, 1.0, 1.0),
            Err(Error::InvalidPosition(_))
        ));
        assert!(Position::new("AAPL", 0.0, 1.0, 1.0).is_err());
        assert!(Position::new("AAPL", 1.0, -5.0, 1.0).is_err());
        assert!(Position::new("AAPL", 1.0, 1.0, -1.0).is_err());
        assert!(Position::new("AAPL", f64::NAN, 1.0, 1.0).is_err());
        assert!(Position::new("AAPL", 1.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn test_cash_equivalent_overrides() {
        let pos = Position::new("spaxx", 1000.0, 1.0, 1.0)
            .unwrap()
            .with_sector("Financial Services")
            .with_day_change(0.01)
            .with_beta(0.3);

        assert!(pos.is_cash_equivalent);
        assert_eq!(pos.asset_class, AssetClass::MoneyMarket);
        assert_eq!(pos.sector_label(), "Cash & Money Market");
        assert_eq!(pos.day_change, 0.0);
        assert_eq!(pos.beta, Some(0.0));
    }

    #[test]
    fn test_reclassification_follows_ticker() {
        let mut pos = Position::new("VTI", 5.0, 200.0, 210.0).unwrap();
        pos.ticker = "^TNX".to_string();
        let pos = pos.classified();

        assert_eq!(pos.asset_class, AssetClass::Treasury);
        assert_eq!(pos.sector_label(), "Fixed Income");
    }

    #[test]
    fn test_lookback_window() {
        assert_eq!("3m".parse::<LookbackWindow>().unwrap().expected_trading_days(), 63);
        assert_eq!("6M".parse::<LookbackWindow>().unwrap().expected_trading_days(), 126);
        assert_eq!(LookbackWindow::default().expected_trading_days(), 252);
        assert_eq!(LookbackWindow::ThreeYears.expected_trading_days(), 756);
        assert!("2w".parse::<LookbackWindow>().is_err());

        let end = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        assert_eq!(
            LookbackWindow::ThreeMonths.start_date(end),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_lookback_window_serde() {
        let json = serde_json::to_string(&LookbackWindow::SixMonths).unwrap();
        assert_eq!(json, "\"6m\"");
        let parsed: LookbackWindow = serde_json::from_str("\"3y\"").unwrap();
        assert_eq!(parsed, LookbackWindow::ThreeYears);
    }

    #[test]
    fn test_price_point_usable() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(PricePoint::new(date, 10.0).is_usable());
        assert!(!PricePoint::new(date, 0.0).is_usable());
        assert!(!PricePoint::new(date, f64::NAN).is_usable());
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
