//! Series alignment and return computation.
//!
//! Per-ticker histories arrive independently and may cover different dates.
//! [`align`] merges them with share counts into one portfolio value series over
//! the union of dates. A ticker missing a date contributes nothing on that date;
//! there is no carry-forward or interpolation.

use crate::types::{HistoricalData, Position, PricePoint, ValuePoint};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Simple period returns `(x_t - x_{t-1}) / x_{t-1}`.
///
/// Zero, negative and non-finite values are dropped first, so `n` usable
/// values give `n - 1` returns and the output never holds NaN or infinity.
pub fn returns(values: &[f64]) -> Vec<f64> {
    let usable: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    usable
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Usable closes of a price series, in order. Zero, negative and non-finite
/// closes are dropped.
pub fn closes(points: &[PricePoint]) -> Vec<f64> {
    points
        .iter()
        .filter(|p| p.is_usable())
        .map(|p| p.close)
        .collect()
}

/// Daily returns of a single price series (used for the benchmark too).
pub fn price_returns(points: &[PricePoint]) -> Vec<f64> {
    returns(&closes(points))
}

/// Values of an aligned series, in date order.
pub fn values(series: &[ValuePoint]) -> Vec<f64> {
    series.iter().map(|p| p.value).collect()
}

/// Build the date-indexed portfolio value series for `positions`.
///
/// 1. Dates are the sorted union over every series in `historical`.
/// 2. Each date sums `close * shares` over positions whose ticker has a usable
///    close on that date.
/// 3. Dates where no position contributed are dropped.
///
/// Tickers with an empty or absent series are tolerated and simply never
/// contribute. If a series repeats a date, the first point wins.
pub fn align(historical: &HistoricalData, positions: &[Position]) -> Vec<ValuePoint> {
    let holdings: Vec<(&str, f64)> = positions
        .iter()
        .map(|p| (p.ticker.as_str(), p.shares))
        .collect();
    align_holdings(historical, &holdings)
}

/// [`align`] over explicit `(ticker, shares)` pairs.
pub fn align_holdings(historical: &HistoricalData, holdings: &[(&str, f64)]) -> Vec<ValuePoint> {
    let all_dates: BTreeSet<NaiveDate> = historical
        .values()
        .flat_map(|series| series.iter().map(|p| p.date))
        .collect();

    let by_date: HashMap<&str, HashMap<NaiveDate, f64>> = historical
        .iter()
        .map(|(ticker, series)| {
            let mut closes = HashMap::with_capacity(series.len());
            for point in series.iter().filter(|p| p.is_usable()) {
                closes.entry(point.date).or_insert(point.close);
            }
            (ticker.as_str(), closes)
        })
        .collect();

    all_dates
        .into_iter()
        .filter_map(|date| {
            let mut total = 0.0;
            let mut has_data = false;

            for (ticker, shares) in holdings {
                if let Some(close) = by_date.get(ticker).and_then(|closes| closes.get(&date)) {
                    total += close * shares;
                    has_data = true;
                }
            }

            has_data.then_some(ValuePoint { date, value: total })
        })
        .collect()
}

/// Truncate two series to their common (minimum) length.
///
/// Cross-series statistics pair observations by position, not by date.
pub fn truncate_pair<'a>(a: &'a [f64], b: &'a [f64]) -> (&'a [f64], &'a [f64]) {
    let n = a.len().min(b.len());
    (&a[..n], &b[..n])
}

/// Per-ticker daily returns, for correlation analysis.
pub fn returns_by_ticker(historical: &HistoricalData) -> BTreeMap<String, Vec<f64>> {
    historical
        .iter()
        .map(|(ticker, series)| (ticker.clone(), price_returns(series)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn series(points: &[(u32, f64)]) -> Vec<PricePoint> {
        points.iter().map(|&(d, c)| PricePoint::new(day(d), c)).collect()
    }

    fn holding(ticker: &str, shares: f64) -> Position {
        Position::new(ticker, shares, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_returns() {
        let r = returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert_abs_diff_eq!(r[0], 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(r[1], -0.10, epsilon = 1e-12);

        assert!(returns(&[]).is_empty());
        assert!(returns(&[100.0]).is_empty());
    }

    #[test]
    fn test_returns_never_divide_by_zero() {
        assert_eq!(returns(&[100.0, 0.0, 50.0]), vec![-0.5]);

        let r = returns(&[100.0, 0.0, 50.0, f64::NAN, 60.0, -2.0]);
        assert_eq!(r.len(), 2);
        assert_abs_diff_eq!(r[0], -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(r[1], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_price_returns_filters_bad_closes() {
        let points = series(&[(1, 100.0), (2, 0.0), (3, 110.0), (4, -3.0), (5, 121.0)]);

        assert_eq!(closes(&points), vec![100.0, 110.0, 121.0]);
        let r = price_returns(&points);
        assert_eq!(r.len(), 2);
        assert_abs_diff_eq!(r[0], 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(r[1], 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_align_partial_coverage() {
        let mut historical = HistoricalData::new();
        historical.insert(
            "AAA".to_string(),
            series(&[(1, 10.0), (2, 11.0), (3, 12.0), (4, 13.0), (5, 14.0)]),
        );
        historical.insert("BBB".to_string(), series(&[(3, 100.0), (4, 101.0), (5, 102.0)]));

        let aligned = align(&historical, &[holding("AAA", 2.0), holding("BBB", 1.0)]);

        assert_eq!(aligned.len(), 5);
        assert_eq!(aligned[0].date, day(1));
        assert_eq!(aligned[0].value, 20.0);
        assert_eq!(aligned[1].value, 22.0);
        assert_eq!(aligned[2].value, 124.0);
        assert_eq!(aligned[4].value, 130.0);
    }

    #[test]
    fn test_align_is_sorted_by_date() {
        let mut historical = HistoricalData::new();
        historical.insert("AAA".to_string(), series(&[(5, 5.0), (1, 1.0), (3, 3.0)]));

        let aligned = align(&historical, &[holding("AAA", 1.0)]);
        let dates: Vec<NaiveDate> = aligned.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(3), day(5)]);
    }

    #[test]
    fn test_align_tolerates_empty_and_missing_series() {
        let mut historical = HistoricalData::new();
        historical.insert("AAA".to_string(), series(&[(1, 10.0), (2, 11.0)]));
        historical.insert("BBB".to_string(), Vec::new());

        let aligned = align(
            &historical,
            &[holding("AAA", 1.0), holding("BBB", 5.0), holding("CCC", 3.0)],
        );
        assert_eq!(values(&aligned), vec![10.0, 11.0]);

        assert!(align(&HistoricalData::new(), &[holding("AAA", 1.0)]).is_empty());
    }

    #[test]
    fn test_align_drops_dates_without_holdings() {
        let mut historical = HistoricalData::new();
        historical.insert("AAA".to_string(), series(&[(2, 10.0), (3, 11.0)]));
        // Only an unheld ticker covers day 1; day 3 has a zero close for BBB.
        historical.insert("ZZZ".to_string(), series(&[(1, 50.0)]));
        historical.insert("BBB".to_string(), series(&[(2, 4.0), (3, 0.0)]));

        let aligned = align(&historical, &[holding("AAA", 1.0), holding("BBB", 1.0)]);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].date, day(2));
        assert_eq!(aligned[0].value, 14.0);
        assert_eq!(aligned[1].value, 11.0);
    }

    #[test]
    fn test_align_duplicate_dates_keep_first() {
        let mut historical = HistoricalData::new();
        historical.insert("AAA".to_string(), series(&[(1, 10.0), (1, 99.0), (2, 11.0)]));

        let aligned = align(&historical, &[holding("AAA", 1.0)]);
        assert_eq!(values(&aligned), vec![10.0, 11.0]);
    }

    #[test]
    fn test_truncate_pair() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0];
        let (x, y) = truncate_pair(&a, &b);
        assert_eq!(x, &[1.0, 2.0]);
        assert_eq!(y, &[5.0, 6.0]);
    }

    #[test]
    fn test_returns_by_ticker() {
        let mut historical = HistoricalData::new();
        historical.insert("AAA".to_string(), series(&[(1, 10.0), (2, 11.0)]));
        historical.insert("BBB".to_string(), Vec::new());

        let by_ticker = returns_by_ticker(&historical);
        assert_eq!(by_ticker["AAA"].len(), 1);
        assert!(by_ticker["BBB"].is_empty());
    }
}
