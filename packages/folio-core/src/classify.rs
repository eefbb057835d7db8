//! Asset classification by ticker symbol.
//!
//! Decides which holdings are cash equivalents. Those are excluded from
//! volatility and beta math, and their day change is forced to zero because
//! their price ticks are yield noise rather than market risk.

use crate::types::{AssetClass, Position};
use serde::{Deserialize, Serialize};

/// Money market funds that are recognised by name.
const MONEY_MARKET_FUNDS: &[&str] = &["VMFXX", "VMMXX", "VMRXX", "SPAXX", "FDRXX", "FDLXX"];

/// Treasury yield and bill proxies.
const TREASURY_SYMBOLS: &[&str] = &[
    "^TNX", // 10-year note yield
    "^FVX", // 5-year
    "^TYX", // 30-year
    "^IRX", // 13-week bill
];

const CASH_SECTOR: &str = "Cash & Money Market";
const FIXED_INCOME_SECTOR: &str = "Fixed Income";
const UNKNOWN_SECTOR: &str = "Unknown";

/// Classification result for one ticker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub asset_class: AssetClass,
    pub is_cash_equivalent: bool,
}

impl Classification {
    /// Sector label to display for this ticker.
    ///
    /// Cash equivalents always report their fixed label; market-data sectors are
    /// meaningless for funds.
    pub fn sector_label(&self, sector: Option<&str>) -> String {
        match self.asset_class {
            AssetClass::MoneyMarket => CASH_SECTOR.to_string(),
            AssetClass::Treasury => FIXED_INCOME_SECTOR.to_string(),
            AssetClass::Equity => sector
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN_SECTOR)
                .to_string(),
        }
    }

    /// Whether the ticker takes part in volatility calculations.
    pub fn include_in_volatility(&self) -> bool {
        !self.is_cash_equivalent
    }

    /// Whether the ticker takes part in beta calculations.
    pub fn include_in_beta(&self) -> bool {
        !self.is_cash_equivalent
    }
}

/// Classify a ticker. Total: unknown tickers are equities.
pub fn classify(ticker: &str) -> Classification {
    let asset_class = if is_money_market_fund(ticker) {
        AssetClass::MoneyMarket
    } else if is_treasury_instrument(ticker) {
        AssetClass::Treasury
    } else {
        AssetClass::Equity
    };

    Classification {
        asset_class,
        is_cash_equivalent: asset_class.is_cash_equivalent(),
    }
}

/// Money market funds end in `XX` (SPAXX, SWVXX, ...) or are listed explicitly.
pub fn is_money_market_fund(ticker: &str) -> bool {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return false;
    }
    ticker.ends_with("XX") || MONEY_MARKET_FUNDS.contains(&ticker.as_str())
}

pub fn is_treasury_instrument(ticker: &str) -> bool {
    let ticker = ticker.trim().to_uppercase();
    TREASURY_SYMBOLS.contains(&ticker.as_str())
}

pub fn is_cash_equivalent(ticker: &str) -> bool {
    classify(ticker).is_cash_equivalent
}

/// Expected annual return assumed for a cash equivalent.
///
/// Money market funds track the risk-free rate; treasury yield symbols and
/// equities contribute nothing here.
pub fn cash_equivalent_return(ticker: &str, risk_free_rate: f64) -> f64 {
    if is_money_market_fund(ticker) {
        risk_free_rate
    } else {
        0.0
    }
}

/// Split positions into `(equity, cash_equivalents)`, classifying from the ticker.
pub fn separate_positions(positions: &[Position]) -> (Vec<Position>, Vec<Position>) {
    positions
        .iter()
        .cloned()
        .partition(|p| !is_cash_equivalent(&p.ticker))
}
