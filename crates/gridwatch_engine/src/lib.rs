//! Gridwatch engine: search page fetching, the refresh pass over a grid and
//! the JSON store document.
mod decode;
mod fetch;
mod persist;
mod refresh;
mod scrape;
mod types;

pub use decode::{decode_page, DecodedPage};
pub use fetch::{FetchSettings, ResultFetcher, ScrapingFetcher};
pub use persist::{
    document_from_json, document_to_json, table_from_json, table_to_json, write_atomically,
    JsonFileStore,
};
pub use refresh::{Clock, NoopSink, ProgressSink, RefreshEngine, DEFAULT_CELL_TIMEOUT};
pub use scrape::parse_search_results;
pub use types::{
    CellReport, FailureKind, FetchError, RefreshEvent, RefreshOutcome, RefreshReport,
    SearchResult,
};
