use serde::Serialize;
use turtlefolio_core::{
    save_sentiment_csv, score_articles, JsonNewsSource, LexiconClassifier, NewsSource,
    SentimentReport, Ticker,
};

use crate::cli::SentimentArgs;
use crate::config::AppConfig;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SentimentData<'a> {
    #[serde(flatten)]
    report: &'a SentimentReport,
    path: String,
}

pub async fn run(args: &SentimentArgs, config: &AppConfig) -> Result<CommandResult, CliError> {
    let ticker = Ticker::parse(&args.ticker)?;
    let articles = JsonNewsSource::new(&args.articles).articles(&ticker).await?;
    let report = score_articles(
        &ticker,
        &articles,
        &LexiconClassifier::new(),
        args.start,
        args.end,
    )?;

    let out_dir = args.out.as_deref().unwrap_or(&config.out_dir);
    let path = save_sentiment_csv(out_dir, &report)?;

    let mut result = CommandResult::ok(serde_json::to_value(SentimentData {
        report: &report,
        path: path.display().to_string(),
    })?);
    for row in &report.rows {
        result = result.with_line(format!("{}: {}", row.article_title, row.sentiment));
    }
    if report.rows.is_empty() {
        result = result.with_warning(format!("No articles for {ticker} in the requested range."));
    }

    Ok(result
        .with_line(format!("Sentiment Summary for {ticker}: {}", report.summary))
        .with_line(format!("Saved sentiment analysis to {}", path.display())))
}
