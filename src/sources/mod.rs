//! The arXiv research source.
//!
//! [`ArxivSource`] composes three layers:
//!
//! - the query builder, which turns an [`ArxivQuery`](crate::models::ArxivQuery) into a
//!   deterministic API URL without touching the network,
//! - resilient fetch ([`with_retry`](crate::utils::with_retry)), which performs the GET
//!   with a per-attempt timeout and bounded exponential backoff,
//! - the feed parser, which turns the Atom document into [`ArxivPaper`](crate::models::ArxivPaper)
//!   records and rejects malformed entries.
//!
//! Every failure surfaces as an [`ArxivError`]; no failure is turned into an empty result.

mod arxiv;

pub use arxiv::feed::{parse_feed, FeedError};
pub use arxiv::query::{build_id_list_query, build_query_url, build_search_query, ARXIV_API_URL};
pub use arxiv::ArxivSource;

use std::time::Duration;

/// Why a single fetch attempt failed. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// The attempt did not complete within the timeout window
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection, TLS or body transfer error
    #[error("network error: {0}")]
    Network(String),
}

/// Errors that can occur when querying arXiv
#[derive(Debug, thiserror::Error)]
pub enum ArxivError {
    /// The query carries no usable criteria; nothing was sent
    #[error("Invalid query: {0}")]
    Construction(String),

    /// The request could not be sent at all (e.g. malformed base URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Every attempt failed with a transient error
    #[error("arXiv request failed after {attempts} attempts: {last}")]
    FetchExhausted { attempts: u32, last: FetchFailure },

    /// The response arrived but is not a usable feed
    #[error("Malformed feed: {0}")]
    MalformedFeed(FeedError),

    /// arXiv answered with an error entry instead of results
    #[error("arXiv API error: {0}")]
    Api(String),

    /// A single-paper lookup came back empty
    #[error("Paper not found: {0}")]
    NotFound(String),

    /// The caller cancelled the operation
    #[error("Request cancelled")]
    Cancelled,
}

impl From<FeedError> for ArxivError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Api(message) => ArxivError::Api(message),
            other => ArxivError::MalformedFeed(other),
        }
    }
}

impl ArxivError {
    /// Whether retrying the whole operation later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ArxivError::FetchExhausted { .. })
    }
}
