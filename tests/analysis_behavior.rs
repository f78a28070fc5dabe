//! Behavior-driven tests for the indicator engine, calendar and analyzer.
//!
//! These tests verify WHAT a user of the library observes when turning a
//! price history into a Turtle signal.

use std::sync::Arc;

use time::macros::date;
use time::{Date, Duration};
use turtlefolio_core::{
    compute_indicators, holidays_for, last_trading_day, AnalysisConfig, AnalysisOutcome, Analyzer,
    BreakoutWindow, FixedClock, HistoryFuture, HistoryRequest, Market, PriceBar, PriceSeries,
    PriceSource, ProviderId, Signal, Ticker, TurtleParams,
};

fn ticker(symbol: &str) -> Ticker {
    Ticker::parse(symbol).expect("valid ticker")
}

/// One bar per day from 2024-01-02 with `high = close + high_offset` and
/// `low = close - 1`.
fn bars(closes: &[f64], high_offset: f64) -> Vec<PriceBar> {
    let start = date!(2024 - 01 - 02);
    closes
        .iter()
        .enumerate()
        .map(|(offset, &close)| {
            PriceBar::new(
                start + Duration::days(offset as i64),
                close,
                close + high_offset,
                close - 1.0,
                close,
                Some(10_000),
            )
            .expect("valid bar")
        })
        .collect()
}

fn series(symbol: &str, closes: &[f64], high_offset: f64) -> PriceSeries {
    PriceSeries::new(ticker(symbol), bars(closes, high_offset)).expect("valid series")
}

/// Serves the same bars for every request.
struct FixedHistory(Vec<PriceBar>);

impl PriceSource for FixedHistory {
    fn id(&self) -> ProviderId {
        ProviderId::Csv
    }

    fn price_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(async move { Ok(PriceSeries::new(req.ticker, self.0.clone()).expect("series")) })
    }
}

fn analyzer(source: FixedHistory, params: TurtleParams) -> Analyzer {
    Analyzer::new(Arc::new(source))
        .with_clock(Arc::new(FixedClock(date!(2024 - 02 - 05))))
        .with_config(AnalysisConfig {
            params,
            ..AnalysisConfig::default()
        })
}

fn twenty_two_rising_closes() -> Vec<f64> {
    (10..=31).map(f64::from).collect()
}

// =============================================================================
// Indicator Engine: Rolling Windows
// =============================================================================

#[test]
fn when_fewer_than_twenty_bars_exist_channel_is_unavailable() {
    // Given: 19 bars of history
    let closes: Vec<f64> = (1..=19).map(f64::from).collect();
    let history = series("AAPL", &closes, 0.5);

    // When: Indicators are computed
    let indicators = compute_indicators(&history, &TurtleParams::default()).expect("indicators");

    // Then: No bar has a 20-day high or low, and nothing is fabricated
    assert_eq!(indicators.len(), 19);
    for row in indicators.rows() {
        assert_eq!(row.channel_high, None);
        assert_eq!(row.channel_low, None);
        assert_eq!(row.atr, None);
        assert!(!row.buy_signal && !row.sell_signal);
    }
}

#[test]
fn when_twenty_bars_accumulate_channel_becomes_defined() {
    // Given: 25 bars of history
    let closes: Vec<f64> = (1..=25).map(f64::from).collect();
    let history = series("AAPL", &closes, 0.5);

    // When: Indicators are computed
    let indicators = compute_indicators(&history, &TurtleParams::default()).expect("indicators");

    // Then: The channel is undefined for the first 19 bars and defined after
    let rows = indicators.rows();
    assert!(rows[..19].iter().all(|row| row.channel_high.is_none()));
    assert!(rows[19..].iter().all(|row| row.channel_high.is_some()));
    assert!(rows.iter().all(|row| row.sma.is_none()), "50-bar SMA needs 50 bars");
}

#[test]
fn when_closes_rise_every_day_buy_fires_from_the_twentieth_bar() {
    // Given: Strictly increasing closes whose intraday highs stay below the close
    let closes: Vec<f64> = (0..40).map(|step| 50.0 + f64::from(step)).collect();
    let history = series("NVDA", &closes, -0.5);

    // When: Indicators are computed with the default inclusive window
    let indicators = compute_indicators(&history, &TurtleParams::default()).expect("indicators");

    // Then: Every bar from the 20th on is a buy, and no bar is ever a sell
    for (index, row) in indicators.rows().iter().enumerate() {
        assert_eq!(row.buy_signal, index >= 19, "buy flag at bar {index}");
        assert!(!row.sell_signal, "sell flag at bar {index}");
    }
}

#[test]
fn when_returns_are_defined_cumulative_return_is_running_product() {
    // Given: A history that breaks out and then keeps moving
    let mut closes: Vec<f64> = (0..30).map(|step| 20.0 + f64::from(step)).collect();
    closes.extend([48.0, 51.0, 47.5, 53.0, 40.0, 39.0, 60.0]);
    let history = series("MSFT", &closes, -0.25);

    // When: Indicators are computed
    let indicators = compute_indicators(&history, &TurtleParams::default()).expect("indicators");
    let rows = indicators.rows();

    // Then: The first bar has no return and each later product extends the previous one
    assert_eq!(rows[0].daily_return, None);
    assert_eq!(rows[0].cumulative_return, None);

    let first = rows[1].daily_return.expect("defined from bar 1");
    let first_cumulative = rows[1].cumulative_return.expect("defined from bar 1");
    assert!((first_cumulative - (1.0 + first)).abs() < 1e-12);

    for pair in rows[1..].windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if let (Some(before), Some(daily), Some(after)) = (
            previous.cumulative_return,
            current.daily_return,
            current.cumulative_return,
        ) {
            assert!((after - before * (1.0 + daily)).abs() < 1e-9);
        }
    }
}

// =============================================================================
// Trading-Day Calendar
// =============================================================================

#[test]
fn when_reference_is_monday_last_trading_day_is_friday() {
    // Given: A Monday with no surrounding holidays
    let monday = date!(2024 - 06 - 10);
    let holidays = holidays_for(Market::UsFederal, 2024);

    // When / Then: The previous Friday is returned
    assert_eq!(last_trading_day(monday, &holidays).expect("day"), date!(2024 - 06 - 07));
}

#[test]
fn when_friday_is_a_holiday_last_trading_day_is_thursday() {
    // Given: Monday after Independence Day, which fell on a Friday in 2025
    let monday = date!(2025 - 07 - 07);
    let holidays = holidays_for(Market::UsFederal, 2025);

    // When / Then: Thursday is returned
    assert_eq!(last_trading_day(monday, &holidays).expect("day"), date!(2025 - 07 - 03));
}

#[test]
fn when_market_is_nyse_good_friday_is_skipped() {
    // Given: The Monday after Good Friday 2024 on the NYSE calendar
    let monday = date!(2024 - 04 - 01);
    let holidays = holidays_for(Market::Nyse, 2024);

    // When / Then: Maundy Thursday is returned
    assert_eq!(last_trading_day(monday, &holidays).expect("day"), date!(2024 - 03 - 28));
}

// =============================================================================
// Single-Ticker Analyzer
// =============================================================================

#[tokio::test]
async fn when_twenty_two_rising_days_are_analyzed_signal_is_buy() {
    // Given: Closes 10..=31 whose highs sit one point under the close
    let source = FixedHistory(bars(&twenty_two_rising_closes(), -1.0));

    // When: The ticker is analyzed with the inclusive window
    let result = analyzer(source, TurtleParams::default()).analyze(ticker("IBM")).await;

    // Then: BUY, with a 20-day high of 30 against a close of 31
    let report = result.outcome.report().expect("completed");
    assert_eq!(report.signal, Signal::Buy);
    assert_eq!(report.channel_high, Some(30.0));
    assert_eq!(report.close, 31.0);
    assert_eq!(report.bars, 22);
}

#[tokio::test]
async fn when_prior_window_is_selected_breakout_measures_previous_days() {
    // Given: Closes 10..=31 whose highs equal the close
    let source = FixedHistory(bars(&twenty_two_rising_closes(), 0.0));
    let params = TurtleParams {
        breakout: BreakoutWindow::Prior,
        ..TurtleParams::default()
    };

    // When: The ticker is analyzed against the previous 20 days only
    let result = analyzer(source, params).analyze(ticker("IBM")).await;

    // Then: The previous day's high of 30 is broken by the close of 31
    let report = result.outcome.report().expect("completed");
    assert_eq!(report.signal, Signal::Buy);
    assert_eq!(report.channel_high, Some(30.0));
}

#[tokio::test]
async fn when_source_has_no_bars_outcome_is_no_data() {
    // Given: A source that answers with an empty history
    let source = FixedHistory(Vec::new());

    // When: The ticker is analyzed
    let result = analyzer(source, TurtleParams::default()).analyze(ticker("DELISTED")).await;

    // Then: No data is reported rather than a failure
    assert_eq!(result.outcome, AnalysisOutcome::NoData);
    assert!(!result.outcome.is_failure());
}

#[tokio::test]
async fn when_start_date_is_after_last_trading_day_outcome_is_no_data() {
    // Given: A start date in the future of the fixed clock
    let start_date: Date = date!(2030 - 01 - 01);
    let analyzer = Analyzer::new(Arc::new(FixedHistory(bars(&[10.0, 11.0], 0.0))))
        .with_clock(Arc::new(FixedClock(date!(2024 - 02 - 05))))
        .with_config(AnalysisConfig {
            start_date,
            ..AnalysisConfig::default()
        });

    // When / Then: Nothing is fetched and no data is reported
    let result = analyzer.analyze(ticker("AAPL")).await;
    assert_eq!(result.outcome, AnalysisOutcome::NoData);
}
