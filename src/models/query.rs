//! Query parameters for the arXiv API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Default page size
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Sort order for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Value of the `sortOrder` query parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// Sort field for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevance,
    LastUpdatedDate,
    #[default]
    SubmittedDate,
}

impl SortBy {
    /// Value of the `sortBy` query parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::SubmittedDate => "submittedDate",
        }
    }
}

/// Inclusive publication window applied to parsed results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Window covering whole calendar days (UTC), either end open
    pub fn from_dates(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            from: from.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|d| d.and_utc()),
            to: to.and_then(|d| d.and_hms_opt(23, 59, 59)).map(|d| d.and_utc()),
        }
    }

    /// Whether neither end is set
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Check an RFC 3339 timestamp against the window
    pub fn contains(&self, published: &str) -> Result<bool, chrono::ParseError> {
        let published = DateTime::parse_from_rfc3339(published.trim())?.with_timezone(&Utc);
        if self.from.is_some_and(|from| published < from) {
            return Ok(false);
        }
        if self.to.is_some_and(|to| published > to) {
            return Ok(false);
        }
        Ok(true)
    }
}

/// arXiv query parameters
///
/// At least one of `category`, `keyword` or `ids` must be set; the URL builder rejects
/// an empty query rather than searching everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArxivQuery {
    /// Category code, e.g. `cs.AI`
    pub category: Option<String>,

    /// Free text, split on whitespace into AND-ed terms
    pub keyword: Option<String>,

    /// Explicit arXiv identifiers, in the order results should come back
    pub ids: Vec<String>,

    /// Offset of the first result
    pub start: usize,

    /// Page size (the API caps this at 2000)
    pub max_results: usize,

    pub sort_by: SortBy,

    pub sort_order: SortOrder,

    /// Publication window, applied after parsing
    pub published: DateRange,
}

impl Default for ArxivQuery {
    fn default() -> Self {
        Self {
            category: None,
            keyword: None,
            ids: Vec::new(),
            start: 0,
            max_results: DEFAULT_MAX_RESULTS,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            published: DateRange::default(),
        }
    }
}

impl ArxivQuery {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Set keyword
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Set category filter
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set explicit id list
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set start offset
    pub fn start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set sort by
    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort_by = sort;
        self
    }

    /// Set sort order
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Set publication window
    pub fn published(mut self, range: DateRange) -> Self {
        self.published = range;
        self
    }
}
