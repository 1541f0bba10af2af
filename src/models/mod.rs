//! Core data models for arXiv papers and queries.

mod paper;
mod query;

pub use paper::{ArxivPaper, ArxivPaperBuilder};
pub use query::{ArxivQuery, DateRange, SortBy, SortOrder};
