//! News sentiment scoring for a ticker.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`NewsSource`] | yields [`Article`]s for a ticker |
//! | [`SentimentClassifier`] | labels a text span |
//! | [`score_articles`] | date filter, chunked majority vote, counts |
//! | [`save_sentiment_csv`] | `<dir>/<TICKER>_sentiment.csv` export |

use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::date::iso_date_option;
use crate::export::create_in;
use crate::{format_date, SentimentError, Ticker, ValidationError};

/// Texts longer than this many characters are classified per chunk.
pub const CHUNK_CHARS: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl Display for SentimentLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            other => Err(format!("unknown sentiment label '{other}'")),
        }
    }
}

/// One news article with its extracted body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, with = "iso_date_option")]
    pub published: Option<Date>,
    #[serde(default)]
    pub text: String,
}

pub type ArticlesFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Article>, SentimentError>> + Send + 'a>>;

/// Supplier of news articles for a ticker.
pub trait NewsSource: Send + Sync {
    fn articles<'a>(&'a self, ticker: &'a Ticker) -> ArticlesFuture<'a>;
}

/// Reads a JSON array of [`Article`]s from a file.
#[derive(Debug, Clone)]
pub struct JsonNewsSource {
    path: PathBuf,
}

impl JsonNewsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NewsSource for JsonNewsSource {
    fn articles<'a>(&'a self, ticker: &'a Ticker) -> ArticlesFuture<'a> {
        Box::pin(async move {
            let body = tokio::fs::read_to_string(&self.path).await?;
            let articles: Vec<Article> = serde_json::from_str(&body)?;
            tracing::debug!(
                ticker = %ticker,
                path = %self.path.display(),
                articles = articles.len(),
                "loaded articles"
            );
            Ok(articles)
        })
    }
}

/// Labels a span of text.
pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> SentimentLabel;
}

/// Offline rule-based classifier over a financial word list.
///
/// Each matched word contributes its weight; a preceding negation flips the
/// sign and a preceding intensifier scales it. The mean score of matched
/// words decides the label against `threshold`.
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    weights: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
    intensifiers: HashMap<&'static str, f64>,
    threshold: f64,
}

const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("bullish", 0.8),
    ("surge", 0.7),
    ("surged", 0.7),
    ("rally", 0.7),
    ("soar", 0.8),
    ("soared", 0.8),
    ("gain", 0.5),
    ("gains", 0.5),
    ("profit", 0.6),
    ("profitable", 0.6),
    ("growth", 0.6),
    ("rise", 0.5),
    ("rises", 0.5),
    ("rose", 0.5),
    ("increase", 0.5),
    ("improve", 0.5),
    ("improved", 0.5),
    ("outperform", 0.7),
    ("beat", 0.6),
    ("beats", 0.6),
    ("exceed", 0.6),
    ("exceeded", 0.6),
    ("strong", 0.5),
    ("optimistic", 0.6),
    ("record", 0.6),
    ("upgrade", 0.6),
    ("upgraded", 0.6),
    ("recovery", 0.5),
    ("rebound", 0.5),
    ("dividend", 0.3),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("bearish", -0.8),
    ("crash", -0.9),
    ("plunge", -0.8),
    ("plunged", -0.8),
    ("drop", -0.6),
    ("dropped", -0.6),
    ("fall", -0.5),
    ("fell", -0.5),
    ("decline", -0.6),
    ("declined", -0.6),
    ("loss", -0.6),
    ("losses", -0.6),
    ("weak", -0.5),
    ("pessimistic", -0.6),
    ("concern", -0.5),
    ("concerns", -0.5),
    ("fear", -0.6),
    ("uncertainty", -0.5),
    ("miss", -0.6),
    ("missed", -0.6),
    ("disappoint", -0.7),
    ("disappointing", -0.7),
    ("underperform", -0.6),
    ("downgrade", -0.6),
    ("downgraded", -0.6),
    ("lawsuit", -0.6),
    ("layoffs", -0.6),
    ("crisis", -0.8),
    ("warning", -0.5),
    ("fraud", -0.9),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "cannot", "cant", "don't", "dont", "doesn't", "doesnt",
    "didn't", "didnt", "won't", "wont", "isn't", "isnt", "wasn't", "wasnt", "hardly", "barely",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5),
    ("extremely", 2.0),
    ("highly", 1.5),
    ("significantly", 1.5),
    ("sharply", 1.7),
    ("slightly", 0.5),
    ("somewhat", 0.7),
    ("marginally", 0.5),
];

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self {
            weights: POSITIVE_WORDS.iter().chain(NEGATIVE_WORDS).copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
            threshold: 0.1,
        }
    }
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.abs();
        self
    }

    /// Mean weight of matched words, `None` if nothing matched.
    pub fn score(&self, text: &str) -> Option<f64> {
        let mut total = 0.0;
        let mut matched = 0_u32;
        let mut negate = false;
        let mut scale = 1.0;

        for raw in text.split_whitespace() {
            let word = raw
                .trim_matches(|ch: char| !ch.is_alphanumeric() && ch != '\'')
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            if self.negations.contains(word.as_str()) {
                negate = true;
                continue;
            }
            if let Some(&factor) = self.intensifiers.get(word.as_str()) {
                scale = factor;
                continue;
            }
            if let Some(&weight) = self.weights.get(word.as_str()) {
                let signed = if negate { -weight } else { weight };
                total += signed * scale;
                matched += 1;
                negate = false;
                scale = 1.0;
            }
        }

        (matched > 0).then(|| total / f64::from(matched))
    }
}

impl SentimentClassifier for LexiconClassifier {
    fn classify(&self, text: &str) -> SentimentLabel {
        match self.score(text) {
            Some(score) if score > self.threshold => SentimentLabel::Positive,
            Some(score) if score < -self.threshold => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

/// Split `text` into pieces of at most `size` characters.
///
/// Splits on char boundaries, so multi-byte text never panics. A zero size
/// returns the whole text as one chunk.
pub fn chunk_text(text: &str, size: usize) -> Vec<&str> {
    if size == 0 {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in text.char_indices() {
        if count == size {
            chunks.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Label an article body, voting across chunks when it is long.
pub fn classify_article(text: &str, classifier: &dyn SentimentClassifier) -> SentimentLabel {
    if text.chars().count() <= CHUNK_CHARS {
        return classifier.classify(text);
    }

    let labels: Vec<SentimentLabel> = chunk_text(text, CHUNK_CHARS)
        .into_iter()
        .map(|chunk| classifier.classify(chunk))
        .collect();
    majority(&labels).unwrap_or(SentimentLabel::Neutral)
}

/// Most frequent label; ties go to the label seen first.
fn majority(labels: &[SentimentLabel]) -> Option<SentimentLabel> {
    let mut tallies: Vec<(SentimentLabel, usize)> = Vec::new();
    for label in labels {
        match tallies.iter_mut().find(|(seen, _)| seen == label) {
            Some((_, count)) => *count += 1,
            None => tallies.push((*label, 1)),
        }
    }

    let mut best: Option<(SentimentLabel, usize)> = None;
    for (label, count) in tallies {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentimentRow {
    pub ticker: Ticker,
    #[serde(with = "iso_date_option")]
    pub date: Option<Date>,
    pub article_title: String,
    pub sentiment: SentimentLabel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentSummary {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentSummary {
    fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }

    pub const fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

impl Display for SentimentSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} positive, {} negative, {} neutral",
            self.positive, self.negative, self.neutral
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentimentReport {
    pub ticker: Ticker,
    pub rows: Vec<SentimentRow>,
    pub summary: SentimentSummary,
}

/// Classify `articles` published within `[start, end]`.
///
/// Either bound may be open. Articles without a publish date are kept only
/// when both bounds are open.
pub fn score_articles(
    ticker: &Ticker,
    articles: &[Article],
    classifier: &dyn SentimentClassifier,
    start: Option<Date>,
    end: Option<Date>,
) -> Result<SentimentReport, ValidationError> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(ValidationError::InvertedDateRange { start, end });
        }
    }

    let mut rows = Vec::new();
    let mut summary = SentimentSummary::default();
    for article in articles {
        if !within(article.published, start, end) {
            continue;
        }

        let sentiment = classify_article(&article.text, classifier);
        summary.record(sentiment);
        rows.push(SentimentRow {
            ticker: ticker.clone(),
            date: article.published,
            article_title: article.title.clone(),
            sentiment,
        });
    }

    tracing::info!(ticker = %ticker, scored = rows.len(), summary = %summary, "scored articles");
    Ok(SentimentReport {
        ticker: ticker.clone(),
        rows,
        summary,
    })
}

fn within(published: Option<Date>, start: Option<Date>, end: Option<Date>) -> bool {
    match published {
        Some(date) => {
            start.map_or(true, |start| date >= start) && end.map_or(true, |end| date <= end)
        }
        None => start.is_none() && end.is_none(),
    }
}

pub fn sentiment_file_name(ticker: &Ticker) -> String {
    format!("{ticker}_sentiment.csv")
}

/// Write `ticker,date,article_title,sentiment` rows.
pub fn write_sentiment_csv<W: Write>(
    writer: W,
    report: &SentimentReport,
) -> Result<(), SentimentError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["ticker", "date", "article_title", "sentiment"])?;
    for row in &report.rows {
        let date = row.date.map(format_date).unwrap_or_default();
        csv_writer.write_record([
            row.ticker.as_str(),
            date.as_str(),
            row.article_title.as_str(),
            row.sentiment.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write `report` to `<dir>/<TICKER>_sentiment.csv`, creating `dir`.
pub fn save_sentiment_csv(
    dir: &Path,
    report: &SentimentReport,
) -> Result<PathBuf, SentimentError> {
    let (path, file) = create_in(dir, &sentiment_file_name(&report.ticker))?;
    write_sentiment_csv(file, report)?;
    tracing::info!(ticker = %report.ticker, path = %path.display(), "saved sentiment export");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    /// Labels by the first character of each chunk.
    struct FirstChar;

    impl SentimentClassifier for FirstChar {
        fn classify(&self, text: &str) -> SentimentLabel {
            match text.chars().next() {
                Some('+') => SentimentLabel::Positive,
                Some('-') => SentimentLabel::Negative,
                _ => SentimentLabel::Neutral,
            }
        }
    }

    fn article(title: &str, published: Option<Date>, text: &str) -> Article {
        Article {
            title: title.to_owned(),
            link: String::new(),
            published,
            text: text.to_owned(),
        }
    }

    fn ticker() -> Ticker {
        Ticker::parse("NVDA").expect("ticker")
    }

    #[test]
    fn chunks_respect_char_boundaries() {
        let text = "é".repeat(5);
        let chunks = chunk_text(&text, 2);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
        assert!(chunk_text("", 512).is_empty());
        assert_eq!(chunk_text("abc", 0), vec!["abc"]);
    }

    #[test]
    fn long_text_uses_majority_of_chunks() {
        let text = format!(
            "{}{}{}",
            "-".repeat(CHUNK_CHARS),
            "+".repeat(CHUNK_CHARS),
            "+".repeat(10)
        );
        assert_eq!(classify_article(&text, &FirstChar), SentimentLabel::Positive);
    }

    #[test]
    fn majority_tie_keeps_first_label() {
        let labels = [SentimentLabel::Negative, SentimentLabel::Positive];
        assert_eq!(majority(&labels), Some(SentimentLabel::Negative));
        assert_eq!(majority(&[]), None);
    }

    #[test]
    fn date_range_filter_is_inclusive() {
        let articles = vec![
            article("early", Some(date!(2024 - 05 - 31)), "+"),
            article("first", Some(date!(2024 - 06 - 01)), "+"),
            article("last", Some(date!(2024 - 06 - 30)), "-"),
            article("undated", None, "+"),
        ];

        let report = score_articles(
            &ticker(),
            &articles,
            &FirstChar,
            Some(date!(2024 - 06 - 01)),
            Some(date!(2024 - 06 - 30)),
        )
        .expect("report");

        let titles: Vec<&str> = report.rows.iter().map(|row| row.article_title.as_str()).collect();
        assert_eq!(titles, vec!["first", "last"]);
        assert_eq!(report.summary.to_string(), "1 positive, 1 negative, 0 neutral");
    }

    #[test]
    fn undated_articles_kept_without_range() {
        let articles = vec![article("undated", None, "x")];
        let report = score_articles(&ticker(), &articles, &FirstChar, None, None).expect("report");
        assert_eq!(report.summary.neutral, 1);
    }

    #[test]
    fn lexicon_handles_negation_and_intensity() {
        let lexicon = LexiconClassifier::new();
        assert_eq!(
            lexicon.classify("Shares surged after earnings beat estimates."),
            SentimentLabel::Positive
        );
        assert_eq!(lexicon.classify("Revenue did not improve."), SentimentLabel::Negative);
        assert_eq!(lexicon.classify("The meeting is on Tuesday."), SentimentLabel::Neutral);
    }

    #[test]
    fn csv_has_expected_columns() {
        let report = score_articles(
            &ticker(),
            &[article("Chips, again", Some(date!(2024 - 06 - 03)), "+")],
            &FirstChar,
            None,
            None,
        )
        .expect("report");

        let mut buffer = Vec::new();
        write_sentiment_csv(&mut buffer, &report).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(
            text,
            "ticker,date,article_title,sentiment\nNVDA,2024-06-03,\"Chips, again\",positive\n"
        );
    }

    #[tokio::test]
    async fn json_source_reads_article_array() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("news.json");
        std::fs::write(
            &path,
            r#"[{"title":"Up","link":"https://news.test/1","published":"2024-06-03","text":"+"},
                {"title":"Undated","text":"-"}]"#,
        )
        .expect("write");

        let articles = JsonNewsSource::new(&path).articles(&ticker()).await.expect("articles");
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].published, Some(date!(2024 - 06 - 03)));
        assert_eq!(articles[1].published, None);
    }
}
