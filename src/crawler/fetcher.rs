//! Fetch engine seam
//!
//! The crawler never talks to the network directly. It hands a URL and a render
//! mode to a [`PageFetcher`] and receives a tagged [`FetchResponse`]. Redirects,
//! timeouts and rendering are the fetcher's business.
//!
//! [`HttpFetcher`] is the reqwest-backed implementation. Its `Rendered` mode
//! presents itself as a full browser navigation; a JavaScript-executing engine
//! can be swapped in by implementing [`PageFetcher`].

use crate::config::{CrawlerConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE,
    PRAGMA, USER_AGENT,
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Browser identity used for rendered fetches when none is configured
const DEFAULT_BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How a URL should be retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Full page rendering, presented as a browser navigation
    Rendered,
    /// Plain HTTP retrieval with the crawler's own identity
    PlainHttp,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rendered => "rendered",
            Self::PlainHttp => "plain_http",
        }
    }
}

/// Whether the response body can be parsed as a text document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    NonText,
}

/// A response produced by the fetch engine
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Document kind derived from the Content-Type
    pub kind: DocumentKind,

    /// Document body, present only for text documents with a success status
    pub body: Option<String>,
}

impl FetchResponse {
    /// Returns true for HTTP 403
    pub fn is_blocked(&self) -> bool {
        self.status == StatusCode::FORBIDDEN.as_u16()
    }

    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures short of an HTTP response
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// Resolves a URL and render mode into a response
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, mode: RenderMode) -> Result<FetchResponse, FetchError>;
}

/// reqwest-backed fetch engine
pub struct HttpFetcher {
    client: Client,
    crawler_user_agent: String,
    browser_user_agent: String,
}

impl HttpFetcher {
    /// Builds a fetcher from the crawler and user agent configuration
    pub fn new(crawler: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(Duration::from_secs(crawler.fetch_timeout))?;

        Ok(Self {
            client,
            crawler_user_agent: user_agent.crawler_user_agent(),
            browser_user_agent: user_agent
                .browser_user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_BROWSER_USER_AGENT.to_string()),
        })
    }

    fn headers_for(&self, mode: RenderMode) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match mode {
            RenderMode::Rendered => {
                insert_header(&mut headers, USER_AGENT, &self.browser_user_agent);
                headers.insert(
                    ACCEPT,
                    HeaderValue::from_static(
                        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
                    ),
                );
                headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
                headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
                headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
                headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
                headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
                headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
                headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
                headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            }
            RenderMode::PlainHttp => {
                insert_header(&mut headers, USER_AGENT, &self.crawler_user_agent);
                headers.insert(ACCEPT, HeaderValue::from_static("text/html,*/*;q=0.8"));
            }
        }
        headers
    }
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(parsed) => {
            headers.insert(name, parsed);
        }
        Err(_) => tracing::warn!("Dropping invalid {} header value: {:?}", name.as_str(), value),
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, mode: RenderMode) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(self.headers_for(mode))
            .send()
            .await?;

        let status = response.status();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let kind = document_kind(content_type.as_deref());

        // Only successful text documents are worth downloading
        let body = if status.is_success() && kind == DocumentKind::Text {
            Some(response.text().await?)
        } else {
            None
        };

        Ok(FetchResponse {
            final_url,
            status: status.as_u16(),
            kind,
            body,
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// User agents are set per request since they depend on the render mode.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .redirect(reqwest::redirect::Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Classifies a Content-Type header value; a missing header is treated as text
pub fn document_kind(content_type: Option<&str>) -> DocumentKind {
    match content_type {
        None => DocumentKind::Text,
        Some(value) => {
            let value = value.to_ascii_lowercase();
            if value.contains("text/html")
                || value.contains("application/xhtml+xml")
                || value.contains("text/plain")
            {
                DocumentKind::Text
            } else {
                DocumentKind::NonText
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_configs() -> (CrawlerConfig, UserAgentConfig) {
        (
            CrawlerConfig {
                seeds: vec!["https://example.com/".to_string()],
                max_depth: 2,
                workers: 2,
                politeness_delay: 0,
                min_paragraph_length: 20,
                fetch_timeout: 5,
            },
            UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
                browser_user_agent: None,
            },
        )
    }

    #[test]
    fn test_build_http_fetcher() {
        let (crawler, user_agent) = create_test_configs();
        assert!(HttpFetcher::new(&crawler, &user_agent).is_ok());
    }

    #[test]
    fn test_rendered_headers_look_like_a_browser() {
        let (crawler, user_agent) = create_test_configs();
        let fetcher = HttpFetcher::new(&crawler, &user_agent).unwrap();
        let headers = fetcher.headers_for(RenderMode::Rendered);

        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert!(headers
            .get(USER_AGENT)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_plain_headers_identify_the_crawler() {
        let (crawler, user_agent) = create_test_configs();
        let fetcher = HttpFetcher::new(&crawler, &user_agent).unwrap();
        let headers = fetcher.headers_for(RenderMode::PlainHttp);

        assert!(headers.get("sec-fetch-mode").is_none());
        assert_eq!(
            headers.get(USER_AGENT).unwrap(),
            "TestCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_document_kind() {
        assert_eq!(document_kind(Some("text/html; charset=utf-8")), DocumentKind::Text);
        assert_eq!(document_kind(Some("application/xhtml+xml")), DocumentKind::Text);
        assert_eq!(document_kind(Some("TEXT/HTML")), DocumentKind::Text);
        assert_eq!(document_kind(None), DocumentKind::Text);
        assert_eq!(document_kind(Some("application/pdf")), DocumentKind::NonText);
        assert_eq!(document_kind(Some("image/png")), DocumentKind::NonText);
    }

    #[test]
    fn test_response_status_helpers() {
        let response = FetchResponse {
            final_url: "https://example.com/".to_string(),
            status: 403,
            kind: DocumentKind::Text,
            body: None,
        };
        assert!(response.is_blocked());
        assert!(!response.is_success());
    }
}
