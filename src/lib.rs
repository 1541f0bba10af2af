//! # arXiv Scout
//!
//! A resilient client for the arXiv Atom-feed query API.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (ArxivPaper, ArxivQuery, etc.)
//! - [`sources`]: The arXiv source: query building, feed parsing and the client tying them together
//! - [`utils`]: HTTP client, retry with backoff, and the response cache capability
//! - [`config`]: Configuration management

pub mod config;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::{ArxivPaper, ArxivQuery};
pub use sources::{ArxivError, ArxivSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
