//! Behavior-driven tests for indicator and sentiment CSV exports.

use std::fs::File;

use time::macros::date;
use turtlefolio_core::{
    compute_indicators, read_indicator_csv, save_indicator_csv, save_sentiment_csv,
    score_articles, Article, IndicatorSeries, LexiconClassifier, PriceBar, PriceSeries, Signal,
    Ticker, TurtleParams,
};

/// Daily bars from 2024-01-01 with `high = close + high_offset` and
/// `low = close + low_offset`.
fn history(closes: &[f64], high_offset: f64, low_offset: f64) -> PriceSeries {
    let ticker = Ticker::parse("AAPL").expect("ticker");
    let bars = closes
        .iter()
        .enumerate()
        .map(|(offset, &close)| {
            PriceBar::new(
                date!(2024 - 01 - 01) + time::Duration::days(offset as i64),
                close,
                close + high_offset,
                close + low_offset,
                close,
                Some(1_000_000),
            )
            .expect("valid bar")
        })
        .collect();
    PriceSeries::new(ticker, bars).expect("series")
}

fn export_and_reread(series: &IndicatorSeries) -> IndicatorSeries {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = save_indicator_csv(&dir.path().join("out"), series).expect("save");
    assert!(path.ends_with("AAPL_turtle_trading.csv"));
    let file = File::open(&path).expect("open");
    read_indicator_csv(file, series.ticker.clone()).expect("read")
}

fn assert_rows_survive(original: &IndicatorSeries, reread: &IndicatorSeries) {
    assert_eq!(reread.len(), original.len());
    for (before, after) in original.rows().iter().zip(reread.rows()) {
        assert_eq!(after.date, before.date);
        assert_eq!(after.buy_signal, before.buy_signal, "buy flag on {}", before.date);
        assert_eq!(after.sell_signal, before.sell_signal, "sell flag on {}", before.date);
        assert_eq!(after.position, before.position);
        assert_eq!(after.channel_high, before.channel_high);
        match (before.cumulative_return, after.cumulative_return) {
            (Some(left), Some(right)) => assert!((left - right).abs() < 1e-12),
            (left, right) => assert_eq!(left, right),
        }
    }
}

#[test]
fn when_a_buy_series_is_exported_and_reread_buy_survives() {
    // Given: 22 rising closes whose highs sit one point under the close
    let closes: Vec<f64> = (10..=31).map(f64::from).collect();
    let series = compute_indicators(&history(&closes, -1.0, -2.0), &TurtleParams::default())
        .expect("indicators");
    assert_eq!(series.signal(), Some(Signal::Buy));

    // When: It is saved to disk and read back
    let reread = export_and_reread(&series);

    // Then: Bar count, every flag, returns and the final BUY match
    assert_rows_survive(&series, &reread);
    assert_eq!(reread.signal(), Some(Signal::Buy));
    assert_eq!(reread.latest().map(|row| row.date), Some(date!(2024 - 01 - 22)));
}

#[test]
fn when_a_sell_series_is_exported_and_reread_sell_survives() {
    // Given: 22 falling closes whose lows sit one point over the close
    let closes: Vec<f64> = (10..=31).rev().map(f64::from).collect();
    let series = compute_indicators(&history(&closes, 2.0, 1.0), &TurtleParams::default())
        .expect("indicators");
    assert_eq!(series.signal(), Some(Signal::Sell));

    // When: It is saved to disk and read back
    let reread = export_and_reread(&series);

    // Then: The short position and its compounded return survive
    assert_rows_survive(&series, &reread);
    assert_eq!(reread.signal(), Some(Signal::Sell));
    assert!(reread.latest().and_then(|row| row.cumulative_return).is_some());
}

#[test]
fn when_articles_are_scored_sentiment_csv_lists_each_article() {
    // Given: Two dated articles and one outside the requested range
    let ticker = Ticker::parse("KO").expect("ticker");
    let articles = vec![
        Article {
            title: "Record profit".to_owned(),
            link: String::new(),
            published: Some(date!(2024 - 06 - 03)),
            text: "Shares surged after record profit and strong growth.".to_owned(),
        },
        Article {
            title: "Guidance cut".to_owned(),
            link: String::new(),
            published: Some(date!(2024 - 06 - 04)),
            text: "The company warned of weak demand and falling margins.".to_owned(),
        },
        Article {
            title: "Old news".to_owned(),
            link: String::new(),
            published: Some(date!(2023 - 01 - 01)),
            text: "Nothing to see.".to_owned(),
        },
    ];

    // When: They are scored for June and saved
    let report = score_articles(
        &ticker,
        &articles,
        &LexiconClassifier::new(),
        Some(date!(2024 - 06 - 01)),
        Some(date!(2024 - 06 - 30)),
    )
    .expect("score");
    let dir = tempfile::tempdir().expect("tempdir");
    let path = save_sentiment_csv(dir.path(), &report).expect("save");

    // Then: Only in-range articles are written, one row each
    let text = std::fs::read_to_string(path).expect("read");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "ticker,date,article_title,sentiment");
    assert_eq!(lines.len(), 3);
    assert_eq!(report.summary.total(), 2);
    assert!(lines[1].starts_with("KO,2024-06-03,Record profit,"));
}
