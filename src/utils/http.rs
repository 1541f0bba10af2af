//! HTTP client utilities.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONNECTION};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::sources::{ArxivError, FetchFailure};
use crate::utils::AttemptError;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const ACCEPT_XML: &str = "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8";

/// Shared HTTP client that identifies itself to the arXiv API
///
/// The client sets no overall request timeout; the retry loop bounds each attempt and
/// drops the request future when the window closes.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, ArxivError> {
        Self::with_user_agent(DEFAULT_USER_AGENT, Duration::from_secs(10))
    }

    /// Create a new HTTP client with a custom user agent
    pub fn with_user_agent(user_agent: &str, connect_timeout: Duration) -> Result<Self, ArxivError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_XML));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ArxivError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// One GET attempt: the body on 2xx, a retryable failure otherwise
    ///
    /// Errors raised before anything reached the wire are fatal.
    pub async fn get_text(&self, url: &str) -> Result<String, AttemptError> {
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Retryable(FetchFailure::Status(status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| AttemptError::Retryable(FetchFailure::Network(e.to_string())))
    }
}

fn classify(err: reqwest::Error) -> AttemptError {
    if err.is_builder() {
        AttemptError::Fatal(ArxivError::InvalidRequest(err.to_string()))
    } else {
        AttemptError::Retryable(FetchFailure::Network(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent() {
        assert!(DEFAULT_USER_AGENT.starts_with("arxiv-scout/"));
    }

    #[tokio::test]
    async fn test_unparseable_url_is_fatal() {
        let client = HttpClient::new().unwrap();
        let err = client.get_text("not a url").await.unwrap_err();
        assert!(matches!(
            err,
            AttemptError::Fatal(ArxivError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_sends_identity_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .match_header("accept", ACCEPT_XML)
            .with_status(200)
            .with_body("<feed/>")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let body = client
            .get_text(&format!("{}/api/query", server.url()))
            .await
            .unwrap();

        assert_eq!(body, "<feed/>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_retryable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .with_status(503)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .get_text(&format!("{}/api/query", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AttemptError::Retryable(FetchFailure::Status(503))
        ));
    }
}
