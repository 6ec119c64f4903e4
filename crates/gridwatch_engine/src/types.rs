use std::fmt;

/// One listing scraped from a search page. `identifier` is the absolute
/// listing URL and is the dedup key across refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub identifier: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            identifier: identifier.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    NoResultsMarkup,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "undecodable page"),
            FailureKind::NoResultsMarkup => write!(f, "no search results markup"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Result of refreshing a single cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fetch succeeded; `new_items` were absent from the seen set before.
    Updated {
        new_items: Vec<SearchResult>,
        fetched: usize,
    },
    /// Fetch failed or timed out. The hit count is now unknown and the seen
    /// set was not touched.
    Degraded { error: FetchError },
}

impl RefreshOutcome {
    pub fn new_count(&self) -> Option<usize> {
        match self {
            RefreshOutcome::Updated { new_items, .. } => Some(new_items.len()),
            RefreshOutcome::Degraded { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, RefreshOutcome::Degraded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    CellStarted {
        row: usize,
        column: usize,
        url: String,
    },
    CellFinished {
        row: usize,
        column: usize,
        new_items: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellReport {
    pub row: usize,
    pub column: usize,
    pub url: String,
    pub outcome: RefreshOutcome,
}

/// Summary of one pass over a grid, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub cells: Vec<CellReport>,
    pub finished_utc: String,
}

impl RefreshReport {
    pub fn refreshed(&self) -> usize {
        self.cells.iter().filter(|c| !c.outcome.is_degraded()).count()
    }

    pub fn degraded(&self) -> usize {
        self.cells.iter().filter(|c| c.outcome.is_degraded()).count()
    }

    pub fn total_new(&self) -> usize {
        self.cells.iter().filter_map(|c| c.outcome.new_count()).sum()
    }
}
