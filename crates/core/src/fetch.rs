//! Content fetching from URLs and local files.
//!
//! This module provides the HTTP session used to retrieve Article pages
//! and their images. One [`SessionFetcher`] is built per conversion so
//! the page fetch and every image download share a connection pool and,
//! when configured, the caller's login cookie.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::images::{FetchResponse, ImageFetcher};
use crate::{KobopressError, Result};

const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const IMAGE_ACCEPT: &str = "image/jpeg,image/png,image/webp,image/gif,image/*;q=0.8,*/*;q=0.5";

/// HTTP client configuration for fetching pages and images.
///
/// This struct controls timeout, user agent, and session cookie settings
/// for HTTP requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Cookie header value sent with every request.
    ///
    /// Articles visible only to logged-in readers need the caller's
    /// browser session, typically `auth_token=<value>`.
    pub cookie: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Kobopress/0.3; +https://github.com/hollandjg/kobopress)".to_string(),
            cookie: None,
        }
    }
}

impl FetchConfig {
    /// Attach a session cookie to every request made through this config.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }
}

/// An HTTP session shared by the page fetch and the image pipeline.
///
/// Implements [`ImageFetcher`], so the same session that retrieved the
/// page also retrieves its images with identical headers and cookie.
pub struct SessionFetcher {
    client: Client,
    config: FetchConfig,
}

impl SessionFetcher {
    /// Builds a session from the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(KobopressError::HttpError)?;

        Ok(Self { client, config })
    }

    /// Fetches an Article page and returns the response body as text.
    ///
    /// Follows redirects, respects the configured timeout, and fails on
    /// non-success status codes so a deleted or protected Article is
    /// reported as an HTTP error rather than extracted as empty content.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.send(url, PAGE_ACCEPT).await?.error_for_status()?;
        let content = response.text().await?;

        Ok(content)
    }

    async fn send(&self, url: &str, accept: &str) -> Result<reqwest::Response> {
        let parsed_url = Url::parse(url).map_err(|e| KobopressError::InvalidUrl(e.to_string()))?;

        let mut request = self
            .client
            .get(parsed_url)
            .header("User-Agent", &self.config.user_agent)
            .header("Accept", accept)
            .header("Accept-Language", "en-US,en;q=0.9");
        if let Some(cookie) = &self.config.cookie {
            request = request.header("Cookie", cookie);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                KobopressError::Timeout { timeout: self.config.timeout }
            } else {
                KobopressError::HttpError(e)
            }
        })
    }
}

#[async_trait]
impl ImageFetcher for SessionFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        let response = self.send(url, IMAGE_ACCEPT).await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(FetchResponse { status, body, content_type })
    }
}

/// Fetches HTML content from a URL using a one-off session.
///
/// Convenience wrapper for callers that do not need to reuse the session
/// for image downloads.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    SessionFetcher::new(config.clone())?.fetch_page(url).await
}

/// Reads HTML content from a local file.
///
/// Useful for converting an Article page saved from a logged-in browser.
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(KobopressError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(KobopressError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("Kobopress"));
        assert!(config.cookie.is_none());
    }

    #[test]
    fn test_fetch_config_with_cookie() {
        let config = FetchConfig::default().with_cookie("auth_token=abc123");
        assert_eq!(config.cookie.as_deref(), Some("auth_token=abc123"));
    }

    #[tokio::test]
    async fn test_fetch_url_invalid() {
        let config = FetchConfig::default();
        let result = fetch_url("not-a-url", &config).await;
        assert!(matches!(result, Err(KobopressError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_session_fetcher_rejects_invalid_url() {
        let session = SessionFetcher::new(FetchConfig::default()).unwrap();
        let result = session.get("no scheme here").await;
        assert!(matches!(result, Err(KobopressError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(KobopressError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_saved_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.html");
        std::fs::write(&path, "<html><body>saved page</body></html>").unwrap();

        let contents = fetch_file(path.to_str().unwrap()).unwrap();
        assert!(contents.contains("saved page"));
    }

    #[test]
    fn test_url_validation() {
        assert!(Url::parse("http://example.com").is_ok());
        assert!(Url::parse("https://example.com").is_ok());
        assert!(Url::parse("example.com").is_err()); // Missing scheme
    }
}
