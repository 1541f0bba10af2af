//! Utility modules supporting arXiv requests.
//!
//! - [`HttpClient`]: HTTP client carrying the identity headers the API expects
//! - [`RetryConfig`]: Configuration for retry logic with exponential backoff and jitter
//! - [`with_retry`]: Execute an operation with a per-attempt timeout and bounded retries
//! - [`ResponseCache`]: Injected storage for fetched feeds ([`NoCache`], [`MemoryCache`])
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use arxiv_scout::utils::{with_retry, HttpClient, RetryConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let config = RetryConfig::default().max_attempts(5);
//! let cancel = CancellationToken::new();
//! let url = "http://export.arxiv.org/api/query?id_list=1706.03762";
//! let _body = with_retry(&config, &cancel, || client.get_text(url)).await?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod http;
mod retry;

pub use cache::{CacheResult, MemoryCache, NoCache, ResponseCache};
pub use http::{HttpClient, DEFAULT_USER_AGENT};
pub use retry::{with_retry, AttemptError, RetryConfig};
