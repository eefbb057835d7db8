//! Fan-out/fan-in gathering of historical series.
//!
//! Requests for every ticker are issued together and awaited as a group. A
//! failed ticker is logged and comes back as an empty series, which the
//! aligner already tolerates, so one bad symbol never blocks the others.

use crate::cache::{Cache, TtlCache};
use crate::classify::separate_positions;
use crate::config::EngineConfig;
use crate::types::{HistoricalData, LookbackWindow, Position, PricePoint};
use crate::Result;
use chrono::NaiveDate;
use futures::future::{join_all, BoxFuture};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// One ticker's history request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryRequest {
    pub ticker: String,
    pub window: LookbackWindow,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HistoryRequest {
    pub fn new(ticker: &str, window: LookbackWindow, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            window,
            start: window.start_date(end),
            end,
        }
    }

    fn cache_key(&self) -> String {
        format!("{}:{}:{}", self.ticker, self.window, self.end)
    }
}

/// A collaborator that can supply daily closes for one ticker.
pub trait HistoricalSource: Send + Sync {
    fn fetch_history<'a>(
        &'a self,
        request: &'a HistoryRequest,
    ) -> BoxFuture<'a, Result<Vec<PricePoint>>>;
}

/// Fetch every ticker concurrently.
///
/// Every requested ticker gets an entry; failures map to an empty series.
pub async fn gather_historical<S>(
    source: &S,
    tickers: &[String],
    window: LookbackWindow,
    end: NaiveDate,
) -> HistoricalData
where
    S: HistoricalSource + ?Sized,
{
    let mut requests: Vec<HistoryRequest> = tickers
        .iter()
        .map(|ticker| HistoryRequest::new(ticker, window, end))
        .filter(|request| !request.ticker.is_empty())
        .collect();
    requests.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    requests.dedup_by(|a, b| a.ticker == b.ticker);

    let futures: Vec<_> = requests
        .iter()
        .map(|request| async move { (request, fetch_or_empty(source, request).await) })
        .collect();

    join_all(futures)
        .await
        .into_iter()
        .map(|(request, series)| (request.ticker.clone(), series))
        .collect()
}

/// Fetch the benchmark series, empty on failure.
pub async fn fetch_benchmark<S>(
    source: &S,
    symbol: &str,
    window: LookbackWindow,
    end: NaiveDate,
) -> Vec<PricePoint>
where
    S: HistoricalSource + ?Sized,
{
    let request = HistoryRequest::new(symbol, window, end);
    fetch_or_empty(source, &request).await
}

/// History for every equity position and the configured benchmark, fetched
/// together. Cash equivalents are never requested.
pub async fn gather_inputs<S>(
    source: &S,
    positions: &[Position],
    config: &EngineConfig,
    window: LookbackWindow,
    end: NaiveDate,
) -> (HistoricalData, Vec<PricePoint>)
where
    S: HistoricalSource + ?Sized,
{
    let (equity, _) = separate_positions(positions);
    let tickers: Vec<String> = equity.into_iter().map(|p| p.ticker).collect();

    futures::join!(
        gather_historical(source, &tickers, window, end),
        fetch_benchmark(source, &config.benchmark_symbol, window, end),
    )
}

async fn fetch_or_empty<S>(source: &S, request: &HistoryRequest) -> Vec<PricePoint>
where
    S: HistoricalSource + ?Sized,
{
    match source.fetch_history(request).await {
        Ok(series) => {
            debug!(
                ticker = %request.ticker,
                points = series.len(),
                "loaded historical series"
            );
            series
        }
        Err(e) => {
            warn!(
                ticker = %request.ticker,
                error = %e,
                "failed to load historical series"
            );
            Vec::new()
        }
    }
}

/// Wraps a source with an injected cache of successful responses.
#[derive(Debug)]
pub struct CachedSource<S, C = TtlCache<Vec<PricePoint>>> {
    inner: S,
    cache: Mutex<C>,
}

impl<S: HistoricalSource> CachedSource<S> {
    /// Cache responses for `ttl`.
    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self::new(inner, TtlCache::new(ttl))
    }

    /// Cache responses for the configured `cache_ttl_secs`.
    pub fn from_config(inner: S, config: &EngineConfig) -> Self {
        Self::with_ttl(inner, Duration::from_secs(config.cache_ttl_secs))
    }
}

impl<S, C> CachedSource<S, C>
where
    S: HistoricalSource,
    C: Cache<Vec<PricePoint>> + Send,
{
    pub fn new(inner: S, cache: C) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn cached(&self, key: &str) -> Option<Vec<PricePoint>> {
        self.cache.lock().ok().and_then(|cache| cache.get(key))
    }

    fn store(&self, key: String, series: Vec<PricePoint>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.set(key, series);
        }
    }
}

impl<S, C> HistoricalSource for CachedSource<S, C>
where
    S: HistoricalSource,
    C: Cache<Vec<PricePoint>> + Send,
{
    fn fetch_history<'a>(
        &'a self,
        request: &'a HistoryRequest,
    ) -> BoxFuture<'a, Result<Vec<PricePoint>>> {
        Box::pin(async move {
            let key = request.cache_key();
            if let Some(series) = self.cached(&key) {
                return Ok(series);
            }

            let series = self.inner.fetch_history(request).await?;
            self.store(key, series.clone());
            Ok(series)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::Duration as Days;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        series: HashMap<String, Vec<PricePoint>>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new(tickers: &[(&str, usize)]) -> Self {
            let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
            let series = tickers
                .iter()
                .map(|(ticker, days)| {
                    let points = (0..*days)
                        .map(|i| PricePoint::new(start + Days::days(i as i64), 100.0 + i as f64))
                        .collect();
                    (ticker.to_string(), points)
                })
                .collect();
            Self {
                series,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl HistoricalSource for StaticSource {
        fn fetch_history<'a>(
            &'a self,
            request: &'a HistoryRequest,
        ) -> BoxFuture<'a, Result<Vec<PricePoint>>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                // Shorter symbols answer last.
                tokio::time::sleep(std::time::Duration::from_millis(
                    (5 - request.ticker.len().min(5)) as u64,
                ))
                .await;
                self.series
                    .get(&request.ticker)
                    .cloned()
                    .ok_or_else(|| Error::Fetch(format!("no data for {}", request.ticker)))
            })
        }
    }

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    #[test]
    fn test_request_window() {
        let request = HistoryRequest::new(" aapl ", LookbackWindow::SixMonths, end());
        assert_eq!(request.ticker, "AAPL");
        assert_eq!(request.start, NaiveDate::from_ymd_opt(2023, 12, 28).unwrap());
    }

    #[tokio::test]
    async fn test_gather_isolates_failures() {
        let source = StaticSource::new(&[("AAPL", 10), ("MSFT", 4)]);
        let tickers = vec!["AAPL".to_string(), "BROKEN".to_string(), "msft".to_string()];

        let historical = gather_historical(&source, &tickers, LookbackWindow::OneYear, end()).await;

        assert_eq!(historical.len(), 3);
        assert_eq!(historical["AAPL"].len(), 10);
        assert_eq!(historical["MSFT"].len(), 4);
        assert!(historical["BROKEN"].is_empty());
    }

    #[tokio::test]
    async fn test_gather_deduplicates() {
        let source = StaticSource::new(&[("AAPL", 3)]);
        let tickers = vec!["AAPL".to_string(), "aapl".to_string(), " ".to_string()];

        let historical = gather_historical(&source, &tickers, LookbackWindow::OneYear, end()).await;

        assert_eq!(historical.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_benchmark_failure_is_empty() {
        let source = StaticSource::new(&[("^GSPC", 5)]);

        let benchmark = fetch_benchmark(&source, "^GSPC", LookbackWindow::OneYear, end()).await;
        assert_eq!(benchmark.len(), 5);

        let missing = fetch_benchmark(&source, "^DJI", LookbackWindow::OneYear, end()).await;
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_gather_inputs_skips_cash() {
        let source = StaticSource::new(&[("AAPL", 8), ("^GSPC", 8)]);
        let positions = vec![
            Position::new("AAPL", 10.0, 100.0, 120.0).unwrap(),
            Position::new("SPAXX", 500.0, 1.0, 1.0).unwrap(),
        ];

        let (historical, benchmark) = gather_inputs(
            &source,
            &positions,
            &EngineConfig::default(),
            LookbackWindow::OneYear,
            end(),
        )
        .await;

        assert_eq!(historical.keys().collect::<Vec<_>>(), vec!["AAPL"]);
        assert_eq!(benchmark.len(), 8);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_source() {
        let source =
            CachedSource::from_config(StaticSource::new(&[("AAPL", 5)]), &EngineConfig::default());
        let request = HistoryRequest::new("AAPL", LookbackWindow::OneYear, end());

        let first = source.fetch_history(&request).await.unwrap();
        let second = source.fetch_history(&request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 1);

        // Another window is another key.
        let other = HistoryRequest::new("AAPL", LookbackWindow::ThreeMonths, end());
        source.fetch_history(&other).await.unwrap();
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);

        // Failures are not cached.
        let missing = HistoryRequest::new("NOPE", LookbackWindow::OneYear, end());
        assert!(source.fetch_history(&missing).await.is_err());
        assert!(source.fetch_history(&missing).await.is_err());
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 4);
    }
}
