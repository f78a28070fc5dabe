//! Bounded fan-out of [`Analyzer`] over many tickers.
//!
//! Each ticker runs in its own tokio task behind a semaphore. Tasks report
//! `(ticker, result)` over an mpsc channel and only the coordinator writes
//! to the aggregate, so nothing is shared mutably between workers. A
//! panicking or timed-out task turns into a `Failed` outcome for its own
//! ticker and never touches its siblings.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinError;

use crate::analyzer::{AnalysisResult, Analyzer};
use crate::{Ticker, ValidationError};

pub const DEFAULT_WORKERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Maximum number of tickers analyzed at once.
    pub workers: usize,
    /// Per-ticker budget; `None` waits indefinitely.
    pub ticker_timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            ticker_timeout: None,
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.workers == 0 {
            return Err(ValidationError::ZeroWorkers);
        }
        Ok(())
    }
}

/// Results of one [`Coordinator::analyze_many`] run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: BTreeMap<Ticker, AnalysisResult>,
    /// Tickers in the order their analyses finished.
    pub completion_order: Vec<Ticker>,
    #[serde(skip)]
    requested: Vec<Ticker>,
}

impl BatchReport {
    /// Deduplicated input tickers in the order first given.
    pub fn requested(&self) -> &[Ticker] {
        &self.requested
    }

    pub fn get(&self, ticker: &Ticker) -> Option<&AnalysisResult> {
        self.results.get(ticker)
    }

    /// Results re-sorted by `tickers`; unknown tickers are skipped.
    pub fn ordered<'a>(&'a self, tickers: &[Ticker]) -> Vec<&'a AnalysisResult> {
        tickers
            .iter()
            .filter_map(|ticker| self.results.get(ticker))
            .collect()
    }

    pub fn failures(&self) -> Vec<&AnalysisResult> {
        self.results
            .values()
            .filter(|result| result.outcome.is_failure())
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.results.values().any(|result| result.outcome.is_failure())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Runs analyses for many tickers with bounded concurrency.
#[derive(Clone)]
pub struct Coordinator {
    analyzer: Analyzer,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(analyzer: Analyzer, config: CoordinatorConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { analyzer, config })
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Analyze one ticker with the same isolation and timeout as a batch.
    pub async fn analyze(&self, ticker: Ticker) -> AnalysisResult {
        run_isolated(self.analyzer.clone(), ticker, self.config.ticker_timeout).await
    }

    /// Analyze every ticker and wait for all of them.
    pub async fn analyze_many(&self, tickers: &[Ticker]) -> BatchReport {
        let mut seen = BTreeSet::new();
        let requested: Vec<Ticker> = tickers
            .iter()
            .filter(|ticker| seen.insert((*ticker).clone()))
            .cloned()
            .collect();

        tracing::info!(
            tickers = requested.len(),
            workers = self.config.workers,
            "starting batch analysis"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let (sender, mut receiver) = mpsc::channel(requested.len().max(1));

        for ticker in &requested {
            let semaphore = Arc::clone(&semaphore);
            let analyzer = self.analyzer.clone();
            let sender = sender.clone();
            let timeout = self.config.ticker_timeout;
            let ticker = ticker.clone();

            tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => run_isolated(analyzer, ticker, timeout).await,
                    Err(_) => AnalysisResult::failed(ticker, "worker pool closed"),
                };
                // The receiver lives until every sender is gone.
                let _ = sender.send(result).await;
            });
        }
        drop(sender);

        let mut results = BTreeMap::new();
        let mut completion_order = Vec::with_capacity(requested.len());
        while let Some(result) = receiver.recv().await {
            completion_order.push(result.ticker.clone());
            results.insert(result.ticker.clone(), result);
        }

        for ticker in &requested {
            if !results.contains_key(ticker) {
                let result = AnalysisResult::failed(
                    ticker.clone(),
                    "analysis task ended without a result",
                );
                self.analyzer.sink().finished(&result);
                completion_order.push(ticker.clone());
                results.insert(ticker.clone(), result);
            }
        }

        let report = BatchReport {
            results,
            completion_order,
            requested,
        };

        tracing::info!(
            tickers = report.len(),
            failed = report.failures().len(),
            "batch analysis complete"
        );
        self.analyzer.sink().batch_finished(&report);
        report
    }
}

async fn run_isolated(
    analyzer: Analyzer,
    ticker: Ticker,
    timeout: Option<Duration>,
) -> AnalysisResult {
    let sink = Arc::clone(analyzer.sink());
    let task_ticker = ticker.clone();
    let handle = tokio::spawn(async move { analyzer.analyze(task_ticker).await });
    let abort = handle.abort_handle();

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                abort.abort();
                tracing::error!(
                    ticker = %ticker,
                    timeout_ms = limit.as_millis() as u64,
                    "analysis timed out"
                );
                let result = AnalysisResult::failed(ticker, format!("timed out after {limit:?}"));
                sink.finished(&result);
                return result;
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(result) => result,
        Err(error) => {
            let reason = join_failure_reason(error);
            tracing::error!(ticker = %ticker, reason = %reason, "analysis task aborted");
            let result = AnalysisResult::failed(ticker, reason);
            sink.finished(&result);
            result
        }
    }
}

fn join_failure_reason(error: JoinError) -> String {
    if !error.is_panic() {
        return "analysis task was cancelled".to_owned();
    }

    match panic_message(error.into_panic()) {
        Some(message) => format!("analysis task panicked: {message}"),
        None => "analysis task panicked".to_owned(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use time::macros::date;

    use super::*;
    use crate::calendar::FixedClock;
    use crate::data_source::{HistoryFuture, HistoryRequest, PriceSource};
    use crate::{PriceBar, PriceSeries, ProviderId};

    /// Sleeps per request and records the peak number of overlapping calls.
    #[derive(Default)]
    struct SlowSource {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl PriceSource for SlowSource {
        fn id(&self) -> ProviderId {
            ProviderId::Csv
        }

        fn price_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.active.fetch_sub(1, Ordering::SeqCst);

                let bar = PriceBar::new(date!(2024 - 06 - 03), 10.0, 11.0, 9.0, 10.5, None)
                    .map_err(crate::data_source::SourceError::from)?;
                PriceSeries::new(req.ticker, vec![bar]).map_err(Into::into)
            })
        }
    }

    fn coordinator(source: Arc<SlowSource>, workers: usize) -> Coordinator {
        let analyzer =
            Analyzer::new(source).with_clock(Arc::new(FixedClock(date!(2024 - 06 - 10))));
        let config = CoordinatorConfig {
            workers,
            ticker_timeout: None,
        };
        Coordinator::new(analyzer, config).expect("valid config")
    }

    fn tickers(symbols: &[&str]) -> Vec<Ticker> {
        Ticker::parse_all(symbols).expect("tickers")
    }

    #[test]
    fn zero_workers_is_rejected() {
        let analyzer = Analyzer::new(Arc::new(SlowSource::default()));
        let config = CoordinatorConfig {
            workers: 0,
            ticker_timeout: None,
        };
        assert!(matches!(
            Coordinator::new(analyzer, config),
            Err(ValidationError::ZeroWorkers)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_never_exceeds_worker_count() {
        let source = Arc::new(SlowSource::default());
        let batch = tickers(&["A", "B", "C", "D", "E", "F", "G"]);

        let report = coordinator(Arc::clone(&source), 2).analyze_many(&batch).await;

        assert_eq!(report.len(), 7);
        assert_eq!(report.completion_order.len(), 7);
        assert!(source.peak.load(Ordering::SeqCst) <= 2);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn duplicate_tickers_are_analyzed_once() {
        let source = Arc::new(SlowSource::default());
        let batch = tickers(&["MSFT", "msft", "AAPL"]);

        let report = coordinator(Arc::clone(&source), 4).analyze_many(&batch).await;

        assert_eq!(report.len(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.requested(), tickers(&["MSFT", "AAPL"]).as_slice());
    }

    #[tokio::test]
    async fn ordered_follows_caller_sequence() {
        let batch = tickers(&["C", "A", "B"]);
        let report = coordinator(Arc::new(SlowSource::default()), 8)
            .analyze_many(&batch)
            .await;

        let order: Vec<&str> = report
            .ordered(&batch)
            .iter()
            .map(|result| result.ticker.as_str())
            .collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_report() {
        let report = coordinator(Arc::new(SlowSource::default()), 8)
            .analyze_many(&[])
            .await;
        assert!(report.is_empty());
        assert!(report.completion_order.is_empty());
    }

    #[test]
    fn panic_payloads_are_readable() {
        assert_eq!(panic_message(Box::new("boom")), Some("boom".to_owned()));
        assert_eq!(panic_message(Box::new(String::from("bang"))), Some("bang".to_owned()));
        assert_eq!(panic_message(Box::new(7_u8)), None);
    }
}
