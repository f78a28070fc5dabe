//! Concrete [`PriceSource`](crate::PriceSource) implementations.

mod csv_source;
mod yahoo;

use std::path::PathBuf;
use std::sync::Arc;

pub use csv_source::CsvPriceSource;
pub use yahoo::YahooAdapter;

use crate::data_source::PriceSource;
use crate::ProviderId;

/// Builds the source selected by `id`; `data_dir` is only used by [`ProviderId::Csv`].
pub fn source_for(id: ProviderId, data_dir: impl Into<PathBuf>) -> Arc<dyn PriceSource> {
    match id {
        ProviderId::Yahoo => Arc::new(YahooAdapter::new()),
        ProviderId::Csv => Arc::new(CsvPriceSource::new(data_dir)),
    }
}
