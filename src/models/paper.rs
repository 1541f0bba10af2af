//! Paper model representing a single arXiv feed entry.

use serde::{Deserialize, Serialize};

/// A paper as projected from an arXiv Atom feed entry
///
/// `link` is the canonical entry URL and the only identity a paper has; callers that
/// persist papers assign their own ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArxivPaper {
    /// Paper title, trimmed
    pub title: String,

    /// Author names in feed order
    pub authors: Vec<String>,

    /// Abstract text, trimmed
    pub summary: String,

    /// Publication timestamp exactly as the feed provides it (ISO-8601)
    pub published: String,

    /// Last updated timestamp exactly as the feed provides it
    pub updated: Option<String>,

    /// Canonical arXiv entry URL
    pub link: String,

    /// Direct PDF URL
    pub pdf_url: Option<String>,

    /// All category codes in feed order
    pub categories: Vec<String>,

    /// Primary category code
    pub primary_category: Option<String>,

    /// DOI of the published version
    pub doi: Option<String>,

    /// Author comment (page counts, venues, ...)
    pub comment: Option<String>,

    /// Journal reference
    pub journal_ref: Option<String>,
}

impl ArxivPaper {
    /// Create a new paper with required fields
    pub fn new(title: String, link: String, published: String) -> Self {
        Self {
            title,
            authors: Vec::new(),
            summary: String::new(),
            published,
            updated: None,
            link,
            pdf_url: None,
            categories: Vec::new(),
            primary_category: None,
            doi: None,
            comment: None,
            journal_ref: None,
        }
    }

    /// The arXiv identifier (with version suffix) taken from the entry link
    pub fn arxiv_id(&self) -> &str {
        self.link
            .rsplit_once("/abs/")
            .map(|(_, id)| id)
            .unwrap_or_else(|| self.link.rsplit('/').next().unwrap_or(&self.link))
    }

    /// Categories joined with commas, the flat form storage layers expect
    pub fn categories_joined(&self) -> String {
        self.categories.join(",")
    }

    /// Authors joined with commas
    pub fn authors_joined(&self) -> String {
        self.authors.join(", ")
    }
}

/// Builder for constructing ArxivPaper objects
#[derive(Debug, Clone)]
pub struct ArxivPaperBuilder {
    paper: ArxivPaper,
}

impl ArxivPaperBuilder {
    /// Create a new builder with required fields
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        published: impl Into<String>,
    ) -> Self {
        Self {
            paper: ArxivPaper::new(title.into(), link.into(), published.into()),
        }
    }

    /// Set authors
    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.paper.authors = authors;
        self
    }

    /// Set abstract
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.paper.summary = summary.into();
        self
    }

    /// Set updated timestamp
    pub fn updated(mut self, updated: Option<String>) -> Self {
        self.paper.updated = updated;
        self
    }

    /// Set PDF URL
    pub fn pdf_url(mut self, url: Option<String>) -> Self {
        self.paper.pdf_url = url;
        self
    }

    /// Set categories
    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.paper.categories = categories;
        self
    }

    /// Set primary category
    pub fn primary_category(mut self, category: Option<String>) -> Self {
        self.paper.primary_category = category;
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: Option<String>) -> Self {
        self.paper.doi = doi;
        self
    }

    /// Set author comment
    pub fn comment(mut self, comment: Option<String>) -> Self {
        self.paper.comment = comment;
        self
    }

    /// Set journal reference
    pub fn journal_ref(mut self, journal_ref: Option<String>) -> Self {
        self.paper.journal_ref = journal_ref;
        self
    }

    /// Build the ArxivPaper
    pub fn build(self) -> ArxivPaper {
        self.paper
    }
}
