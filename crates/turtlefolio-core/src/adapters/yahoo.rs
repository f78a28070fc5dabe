//! Yahoo Finance chart adapter.
//!
//! Daily bars come from the v8 chart endpoint with `period1`/`period2` Unix
//! bounds; the end date is inclusive. Transport failures and retryable
//! statuses (408, 429, 5xx) are retried with [`RetryConfig`] backoff. A
//! "No data found" chart error is an empty series, not a failure.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::data_source::{HistoryFuture, HistoryRequest, PriceSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::retry::RetryConfig;
use crate::{PriceBar, PriceSeries, ProviderId};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const COOKIE_ENV: &str = "YAHOO_COOKIE";

/// Daily history from the Yahoo Finance v8 chart endpoint.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    retry: RetryConfig,
    base_url: String,
    cookie: Option<String>,
    request_timeout: Duration,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
            .with_cookie(std::env::var(COOKIE_ENV).ok())
    }
}

impl YahooAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            retry: RetryConfig::default(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            cookie: None,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn chart_url(&self, req: &HistoryRequest) -> Result<String, SourceError> {
        let period1 = unix_midnight(req.start);
        let after_end = req
            .end
            .next_day()
            .ok_or_else(|| SourceError::invalid_request("end date is out of range"))?;
        let period2 = unix_midnight(after_end);

        Ok(format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=div%2Csplit",
            self.base_url,
            urlencoding::encode(req.ticker.as_str()),
            period1,
            period2
        ))
    }

    async fn fetch_history(&self, req: HistoryRequest) -> Result<PriceSeries, SourceError> {
        let url = self.chart_url(&req)?;
        let mut attempt = 0;

        loop {
            match self.fetch_once(&url).await {
                Ok(body) => return parse_chart(&req, &body),
                Err(error) if error.retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::debug!(
                        ticker = %req.ticker,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying yahoo chart request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, SourceError> {
        let mut request = HttpRequest::get(url)
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout(self.request_timeout);
        if let Some(cookie) = &self.cookie {
            request = request.with_header("cookie", cookie.clone());
        }

        let response = self.http_client.execute(request).await.map_err(|error| {
            SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
        })?;

        match response.status {
            status if (200..300).contains(&status) => Ok(response.body),
            // The chart endpoint reports unknown symbols as 404 with a JSON error body.
            404 => Ok(response.body),
            429 => Err(SourceError::rate_limited("yahoo returned status 429")),
            status if self.retry.should_retry_status(status) => Err(SourceError::unavailable(
                format!("yahoo returned status {status}"),
            )),
            status => Err(SourceError::invalid_request(format!(
                "yahoo returned status {status}"
            ))),
        }
    }
}

impl PriceSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn price_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(self.fetch_history(req))
    }
}

fn unix_midnight(date: Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp()
}

fn parse_chart(req: &HistoryRequest, body: &str) -> Result<PriceSeries, SourceError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|error| SourceError::parse(format!("failed to parse yahoo chart: {error}")))?;

    if let Some(error) = response.chart.error {
        if error.description.contains("No data found") {
            return Ok(PriceSeries::empty(req.ticker.clone()));
        }
        if error.code.eq_ignore_ascii_case("not found") {
            return Err(SourceError::not_found(format!(
                "yahoo has no symbol {}: {}",
                req.ticker, error.description
            )));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo chart API error: {} ({})",
            error.description, error.code
        )));
    }

    let Some(result) = response.chart.result.and_then(|results| results.into_iter().next())
    else {
        return Ok(PriceSeries::empty(req.ticker.clone()));
    };
    let Some(timestamps) = result.timestamp else {
        return Ok(PriceSeries::empty(req.ticker.clone()));
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(PriceSeries::empty(req.ticker.clone()));
    };
    let gmt_offset = result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0);

    let mut bars = Vec::with_capacity(timestamps.len());
    for (index, &timestamp) in timestamps.iter().enumerate() {
        let date = OffsetDateTime::from_unix_timestamp(timestamp.saturating_add(gmt_offset))
            .map_err(|error| SourceError::parse(format!("invalid timestamp: {error}")))?
            .date();
        if !req.contains(date) {
            continue;
        }

        let (Some(open), Some(high), Some(low), Some(close)) = (
            value_at(&quote.open, index),
            value_at(&quote.high, index),
            value_at(&quote.low, index),
            value_at(&quote.close, index),
        ) else {
            continue;
        };
        let volume = quote
            .volume
            .get(index)
            .copied()
            .flatten()
            .and_then(|volume| u64::try_from(volume).ok());

        match PriceBar::new(date, open, high, low, close, volume) {
            Ok(bar) => bars.push(bar),
            Err(error) => {
                tracing::debug!(ticker = %req.ticker, %date, %error, "skipping invalid yahoo bar");
            }
        }
    }

    bars.sort_by_key(|bar| bar.date);
    bars.dedup_by_key(|bar| bar.date);

    PriceSeries::new(req.ticker.clone(), bars).map_err(SourceError::from)
}

fn value_at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}
