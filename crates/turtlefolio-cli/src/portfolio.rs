//! JSON-backed mapping of username to tickers.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use turtlefolio_core::Ticker;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioStore {
    path: PathBuf,
    portfolios: BTreeMap<String, Vec<Ticker>>,
    /// Entries that are not valid symbols, written back untouched on save.
    unparsed: BTreeMap<String, Vec<String>>,
}

impl PortfolioStore {
    /// Load `path`. A missing file is an empty store; unreadable JSON is
    /// logged and also treated as empty. Invalid symbols are kept aside
    /// with a warning and duplicates keep their first position.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CliError> {
        let path = path.into();
        let raw: BTreeMap<String, Vec<String>> = match std::fs::read_to_string(&path) {
            Ok(body) => match serde_json::from_str(&body) {
                Ok(raw) => raw,
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "portfolio file is empty or invalid JSON, starting with an empty portfolio"
                    );
                    BTreeMap::new()
                }
            },
            Err(error) if error.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(error.into()),
        };

        let mut portfolios = BTreeMap::new();
        let mut unparsed: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (user, symbols) in raw {
            let mut tickers: Vec<Ticker> = Vec::with_capacity(symbols.len());
            for symbol in symbols {
                match Ticker::parse(&symbol) {
                    Ok(ticker) if tickers.contains(&ticker) => {}
                    Ok(ticker) => tickers.push(ticker),
                    Err(error) => {
                        tracing::warn!(
                            path = %path.display(),
                            user = %user,
                            symbol = %symbol,
                            %error,
                            "skipping invalid ticker in portfolio file"
                        );
                        unparsed.entry(user.clone()).or_default().push(symbol);
                    }
                }
            }
            portfolios.insert(user, tickers);
        }

        Ok(Self {
            path,
            portfolios,
            unparsed,
        })
    }

    /// Write the store as 4-space indented JSON, creating parent directories.
    pub fn save(&self) -> Result<(), CliError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut document: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (user, tickers) in &self.portfolios {
            document
                .entry(user.as_str())
                .or_default()
                .extend(tickers.iter().map(Ticker::as_str));
        }
        for (user, symbols) in &self.unparsed {
            document
                .entry(user.as_str())
                .or_default()
                .extend(symbols.iter().map(String::as_str));
        }

        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        document.serialize(&mut serializer)?;
        std::fs::write(&self.path, buffer)?;
        Ok(())
    }

    pub fn add(&mut self, user: &str, ticker: Ticker) -> AddOutcome {
        let tickers = self.portfolios.entry(user.to_owned()).or_default();
        if tickers.contains(&ticker) {
            return AddOutcome::AlreadyPresent;
        }
        tickers.push(ticker);
        AddOutcome::Added
    }

    /// Returns whether the ticker was present.
    pub fn remove(&mut self, user: &str, ticker: &Ticker) -> bool {
        let Some(tickers) = self.portfolios.get_mut(user) else {
            return false;
        };
        let before = tickers.len();
        tickers.retain(|held| held != ticker);
        before != tickers.len()
    }

    pub fn tickers(&self, user: &str) -> &[Ticker] {
        self.portfolios.get(user).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(symbol: &str) -> Ticker {
        Ticker::parse(symbol).expect("ticker")
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PortfolioStore::load(dir.path().join("portfolios.json")).expect("load");
        assert!(store.tickers("ana").is_empty());
    }

    #[test]
    fn invalid_json_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("portfolios.json");
        std::fs::write(&path, "{ not json").expect("write");

        let store = PortfolioStore::load(&path).expect("load");
        assert!(store.tickers("ana").is_empty());
    }

    #[test]
    fn add_refuses_duplicates_and_keeps_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = PortfolioStore::load(dir.path().join("p.json")).expect("load");

        assert_eq!(store.add("ana", ticker("KO")), AddOutcome::Added);
        assert_eq!(store.add("ana", ticker("AAPL")), AddOutcome::Added);
        assert_eq!(store.add("ana", ticker("ko")), AddOutcome::AlreadyPresent);
        assert_eq!(store.tickers("ana"), &[ticker("KO"), ticker("AAPL")]);
    }

    #[test]
    fn save_then_load_round_trips_with_four_space_indent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("portfolios.json");

        let mut store = PortfolioStore::load(&path).expect("load");
        store.add("ana", ticker("KO"));
        store.add("bo", ticker("MSFT"));
        assert!(store.remove("bo", &ticker("MSFT")));
        assert!(!store.remove("bo", &ticker("MSFT")));
        store.save().expect("save");

        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("\n    \"ana\": [\n        \"KO\"\n    ]"), "{text}");

        let reloaded = PortfolioStore::load(&path).expect("reload");
        assert_eq!(reloaded, store);
    }

    #[test]
    fn invalid_symbols_do_not_wipe_other_portfolios() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("portfolios.json");
        std::fs::write(&path, r#"{"ana":["AAPL","MSFT"],"bo":["^GSPC"]}"#).expect("write");

        let mut store = PortfolioStore::load(&path).expect("load");
        assert_eq!(store.tickers("ana"), &[ticker("AAPL"), ticker("MSFT")]);
        assert!(store.tickers("bo").is_empty());

        store.add("cy", ticker("KO"));
        store.save().expect("save");

        let saved: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(saved["ana"], vec!["AAPL", "MSFT"]);
        assert_eq!(saved["bo"], vec!["^GSPC"]);
        assert_eq!(saved["cy"], vec!["KO"]);
    }

    #[test]
    fn duplicate_symbols_collapse_on_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("portfolios.json");
        std::fs::write(&path, r#"{"ana":["ko","AAPL","KO"]}"#).expect("write");

        let mut store = PortfolioStore::load(&path).expect("load");
        assert_eq!(store.tickers("ana"), &[ticker("KO"), ticker("AAPL")]);
        assert!(store.remove("ana", &ticker("KO")));
        assert_eq!(store.tickers("ana"), &[ticker("AAPL")]);
    }
}
