//! arXiv research source implementation.

pub(crate) mod feed;
pub(crate) mod query;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::models::{ArxivPaper, ArxivQuery};
use crate::sources::{ArxivError, FeedError};
use crate::utils::{
    with_retry, CacheResult, HttpClient, MemoryCache, NoCache, ResponseCache, RetryConfig,
};

use feed::parse_feed;
use query::{build_query_url, ARXIV_API_URL};

/// Ids per `id_list` request; the API returns at most this many without `max_results`
const ID_LIST_BATCH: usize = 10;

static NEW_STYLE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\.\d{4,5}(v\d+)?$").expect("valid regex"));
static OLD_STYLE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z\-]*(\.[A-Za-z\-]{2,})?/\d{7}(v\d+)?$").expect("valid regex")
});

/// arXiv research source
///
/// Stateless apart from its configuration: concurrent calls share nothing but the
/// connection pool and the injected cache.
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    base_url: String,
    retry: RetryConfig,
    cache: Arc<dyn ResponseCache>,
}

impl ArxivSource {
    /// Create a new arXiv source against the public endpoint
    pub fn new() -> Result<Self, ArxivError> {
        Ok(Self::with_client(HttpClient::new()?))
    }

    /// Create a source from application configuration
    pub fn from_config(config: &Config) -> Result<Self, ArxivError> {
        let client = HttpClient::with_user_agent(
            &config.arxiv.user_agent,
            Duration::from_secs(config.arxiv.connect_timeout_secs),
        )?;

        let cache: Arc<dyn ResponseCache> = if config.cache.enabled {
            Arc::new(MemoryCache::from_config(&config.cache))
        } else {
            Arc::new(NoCache)
        };

        Ok(Self::with_client(client)
            .base_url(&config.arxiv.base_url)
            .retry_config(RetryConfig::from(&config.retry))
            .cache(cache))
    }

    /// Create with a custom HTTP client (for testing)
    pub fn with_client(client: HttpClient) -> Self {
        Self {
            client,
            base_url: ARXIV_API_URL.to_string(),
            retry: RetryConfig::default(),
            cache: Arc::new(NoCache),
        }
    }

    /// Point the source at another endpoint
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override timeout and backoff settings
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Inject a response cache
    pub fn cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Parse an arXiv ID from various formats
    ///
    /// Handles formats like:
    /// - "2301.12345"
    /// - "2301.12345v1" (version is kept)
    /// - "arXiv:2301.12345"
    /// - "https://arxiv.org/abs/2301.12345v1"
    /// - "https://arxiv.org/pdf/2301.12345v1.pdf"
    /// - "math/0104020" (pre-2007 scheme)
    pub fn parse_id(id: &str) -> Result<String, ArxivError> {
        let mut id = id.trim();

        for marker in ["/abs/", "/pdf/"] {
            if let Some(pos) = id.find(marker) {
                id = &id[pos + marker.len()..];
                break;
            }
        }
        id = id.strip_suffix(".pdf").unwrap_or(id);
        if id.get(..6).is_some_and(|p| p.eq_ignore_ascii_case("arxiv:")) {
            id = &id[6..];
        }
        let id = id.trim_end_matches('/');

        if NEW_STYLE_ID.is_match(id) || OLD_STYLE_ID.is_match(id) {
            Ok(id.to_string())
        } else {
            Err(ArxivError::Construction(format!(
                "unrecognised arXiv id: {:?}",
                id
            )))
        }
    }

    /// Search arXiv, returning papers in the order the API sorted them
    pub async fn search(&self, query: &ArxivQuery) -> Result<Vec<ArxivPaper>, ArxivError> {
        self.search_with_cancellation(query, &CancellationToken::new())
            .await
    }

    /// Search arXiv, giving up with [`ArxivError::Cancelled`] once `cancel` fires
    pub async fn search_with_cancellation(
        &self,
        query: &ArxivQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<ArxivPaper>, ArxivError> {
        let url = build_query_url(&self.base_url, query)?;
        let papers = self.fetch_feed(&url, cancel).await?;

        if query.published.is_unbounded() {
            return Ok(papers);
        }

        let mut kept = Vec::with_capacity(papers.len());
        for (index, paper) in papers.into_iter().enumerate() {
            let inside = query.published.contains(&paper.published).map_err(|_| {
                FeedError::InvalidTimestamp {
                    index,
                    value: paper.published.clone(),
                }
            })?;
            if inside {
                kept.push(paper);
            }
        }
        Ok(kept)
    }

    /// Search by free-text keyword and/or category, newest submissions first
    pub async fn search_by_keyword_and_category(
        &self,
        keyword: Option<&str>,
        category: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<ArxivPaper>, ArxivError> {
        let mut query = ArxivQuery::new().max_results(max_results);
        query.keyword = keyword.map(str::to_string);
        query.category = category.map(str::to_string);
        self.search(&query).await
    }

    /// Fetch papers by id, in the order the ids were given
    pub async fn fetch_by_ids<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<Vec<ArxivPaper>, ArxivError> {
        self.fetch_by_ids_with_cancellation(ids, &CancellationToken::new())
            .await
    }

    /// Fetch papers by id, giving up with [`ArxivError::Cancelled`] once `cancel` fires
    pub async fn fetch_by_ids_with_cancellation<S: AsRef<str>>(
        &self,
        ids: &[S],
        cancel: &CancellationToken,
    ) -> Result<Vec<ArxivPaper>, ArxivError> {
        let ids = ids
            .iter()
            .map(|id| Self::parse_id(id.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if ids.is_empty() {
            return Err(ArxivError::Construction("the id list is empty".to_string()));
        }

        let mut papers = Vec::with_capacity(ids.len());
        for batch in ids.chunks(ID_LIST_BATCH) {
            let url = build_query_url(&self.base_url, &ArxivQuery::new().ids(batch.iter().cloned()))?;
            papers.extend(self.fetch_feed(&url, cancel).await?);
        }
        Ok(papers)
    }

    /// Fetch a single paper by id
    pub async fn get_by_id(&self, id: &str) -> Result<ArxivPaper, ArxivError> {
        self.fetch_by_ids(&[id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ArxivError::NotFound(id.to_string()))
    }

    async fn fetch_feed(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ArxivPaper>, ArxivError> {
        url::Url::parse(url)
            .map_err(|e| ArxivError::InvalidRequest(format!("{}: {}", url, e)))?;

        if cancel.is_cancelled() {
            return Err(ArxivError::Cancelled);
        }

        if let CacheResult::Hit(body) = self.cache.get(url) {
            return Ok(parse_feed(&body)?);
        }

        tracing::debug!("Querying arXiv: {}", url);
        let client = &self.client;
        let body = with_retry(&self.retry, cancel, || client.get_text(url)).await?;

        let papers = parse_feed(&body)?;
        self.cache.put(url, &body);
        tracing::debug!("arXiv returned {} papers", papers.len());
        Ok(papers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        // Basic formats
        assert_eq!(ArxivSource::parse_id("2301.12345").unwrap(), "2301.12345");
        assert_eq!(
            ArxivSource::parse_id("arxiv:2301.12345").unwrap(),
            "2301.12345"
        );
        assert_eq!(
            ArxivSource::parse_id("https://arxiv.org/abs/2301.12345v1").unwrap(),
            "2301.12345v1"
        );
        assert_eq!(
            ArxivSource::parse_id("https://arxiv.org/pdf/2301.12345v2.pdf").unwrap(),
            "2301.12345v2"
        );

        // Case insensitive prefix
        assert_eq!(
            ArxivSource::parse_id(" ARXIV:2301.1234 ").unwrap(),
            "2301.1234"
        );
    }

    #[test]
    fn test_parse_id_old_format() {
        assert_eq!(
            ArxivSource::parse_id("https://arxiv.org/abs/math/0104020v1").unwrap(),
            "math/0104020v1"
        );
        assert_eq!(
            ArxivSource::parse_id("math.GT/0309136").unwrap(),
            "math.GT/0309136"
        );
        assert_eq!(
            ArxivSource::parse_id("hep-th/9901001").unwrap(),
            "hep-th/9901001"
        );
    }

    #[test]
    fn test_parse_id_errors() {
        assert!(ArxivSource::parse_id("").is_err());
        assert!(ArxivSource::parse_id("   ").is_err());
        assert!(ArxivSource::parse_id("not-an-id").is_err());
        assert!(matches!(
            ArxivSource::parse_id("2301"),
            Err(ArxivError::Construction(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_query_never_hits_network() {
        let source = ArxivSource::new()
            .unwrap()
            .base_url("http://127.0.0.1:9/unreachable");

        let err = source.search(&ArxivQuery::new()).await.unwrap_err();
        assert!(matches!(err, ArxivError::Construction(_)));

        let err = source.fetch_by_ids::<&str>(&[]).await.unwrap_err();
        assert!(matches!(err, ArxivError::Construction(_)));
    }

    #[tokio::test]
    async fn test_cancelled_call_ignores_cached_body() {
        let base_url = "http://127.0.0.1:9/api/query";
        let query = ArxivQuery::new().category("cs.AI");
        let cache = Arc::new(MemoryCache::new(Duration::from_secs(60), 4));
        cache.put(
            &build_query_url(base_url, &query).unwrap(),
            r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#,
        );

        let source = ArxivSource::new()
            .unwrap()
            .base_url(base_url)
            .cache(cache);

        assert!(source.search(&query).await.unwrap().is_empty());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = source
            .search_with_cancellation(&query, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ArxivError::Cancelled));
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_fatal_without_retry() {
        let source = ArxivSource::new().unwrap().base_url("not a url");

        let err = source
            .search_by_keyword_and_category(Some("transformers"), None, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ArxivError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_from_config() {
        let mut config = Config::default();
        config.arxiv.base_url = "http://localhost:1/api/query".to_string();
        config.cache.enabled = true;

        let source = ArxivSource::from_config(&config).unwrap();
        assert_eq!(source.base_url, "http://localhost:1/api/query");
        assert_eq!(source.retry, RetryConfig::default());
    }
}
