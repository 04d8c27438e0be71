//! HTTP fetcher implementation
//!
//! This module handles the network side of a dispatch:
//! - Building the HTTP client with the crawler's user agent
//! - GET requests with session headers, cookies and token attached
//! - Classifying failures into `FetchError`

use super::session::SessionContext;
use super::traits::Fetcher;
use crate::config::UserAgentConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Maximum redirect hops followed for one fetch
const MAX_REDIRECTS: usize = 10;

/// Outcome of fetching one URL
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    /// The URL that was dispatched
    pub url: String,

    pub success: bool,

    /// Fetched content, present on success
    pub payload: Option<Payload>,

    /// Links the fetcher found itself (in addition to any extractor)
    pub discovered_links: Vec<String>,

    pub error: Option<String>,
}

impl FetchResult {
    pub fn success(url: impl Into<String>, payload: Payload) -> Self {
        Self {
            url: url.into(),
            success: true,
            payload: Some(payload),
            ..Self::default()
        }
    }

    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.discovered_links = links.into_iter().map(Into::into).collect();
        self
    }
}

/// Content returned by a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Final URL after redirects
    pub final_url: String,
    pub status_code: u16,
    pub content_type: String,
    pub body: String,
}

impl Payload {
    pub fn is_html(&self) -> bool {
        self.content_type.is_empty() || self.content_type.contains("html")
    }
}

/// Builds an HTTP client with proper configuration
///
/// The user agent is `Name/Version (+ContactURL)`; `timeout` bounds the
/// whole request.
///
/// # Example
///
/// ```no_run
/// use ripple_frontier::config::UserAgentConfig;
/// use ripple_frontier::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain reqwest-backed fetcher
///
/// Every non-2xx status, 4xx included, is reported as a failure and
/// therefore retried under the frontier's retry budget.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, timeout)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        session: Option<&SessionContext>,
    ) -> Result<FetchResult, FetchError> {
        let mut request = self.client.get(url);
        if let Some(session) = session {
            request = session.apply(request);
        }

        let response = request.send().await.map_err(classify_error)?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(FetchResult::success(
            url,
            Payload {
                final_url,
                status_code: status.as_u16(),
                content_type,
                body,
            },
        ))
    }
}

/// Maps a transport error onto the fetch taxonomy
fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Connect(e.to_string())
    } else {
        FetchError::Other(e.to_string())
    }
}
