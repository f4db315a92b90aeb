//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building an HTTP client with browser-like default headers
//! - Rotating User-Agent strings across attempts
//! - Detecting anti-bot block pages served with a 200 status
//! - Retry logic for transient failures
//! - Error classification

use crate::config::CrawlerConfig;
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Phrases that mark a response as a block page rather than a listing
const BLOCK_MARKERS: &[&str] = &[
    "captcha",
    "access denied",
    "request blocked",
    "验证码",
    "拒绝访问",
    "非法请求",
];

/// Why a page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchErrorKind {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("blocked response: {0}")]
    BlockedResponse(String),

    #[error("gave up after {attempts} attempts, last error: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<FetchErrorKind>,
    },
}

impl FetchErrorKind {
    /// Returns true if another attempt may succeed
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Timeout | Retry |
    /// | Connection failure | Retry |
    /// | HTTP 5xx | Retry |
    /// | HTTP 429 | Retry |
    /// | Block page | Retry with another User-Agent |
    /// | Other HTTP 4xx | Fail immediately |
    pub fn is_transient(&self) -> bool {
        match self {
            FetchErrorKind::Timeout
            | FetchErrorKind::ConnectionFailed(_)
            | FetchErrorKind::BlockedResponse(_) => true,
            FetchErrorKind::HttpStatus(code) => {
                *code >= 500 || *code == StatusCode::TOO_MANY_REQUESTS.as_u16()
            }
            FetchErrorKind::RetriesExhausted { .. } => false,
        }
    }
}

/// A page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{url}: {kind}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(url: &Url, kind: FetchErrorKind) -> Self {
        Self {
            url: url.to_string(),
            kind,
        }
    }
}

/// How many times a page is tried and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Base delay; the wait grows linearly with the attempt number
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

/// Anything that can hand back the markup of a listing page
///
/// The crawl driver is generic over this so it can run against the live
/// site or a scripted set of pages.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Fetches one page, retrying transient failures internally
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// The User-Agent is set per request so it can rotate; everything else a
/// browser would send is attached as a default header.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    let timeout = Duration::from_secs(config.request_timeout_secs);

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Checks a successful response body for signs of an anti-bot page
///
/// # Returns
///
/// * `Some(reason)` - The body is too short or carries a block marker
/// * `None` - The body looks like real content
pub fn detect_block(body: &str, min_body_bytes: usize) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.len() < min_body_bytes {
        return Some(format!("response too short ({} bytes)", trimmed.len()));
    }

    let lower = trimmed.to_lowercase();
    BLOCK_MARKERS
        .iter()
        .find(|marker| lower.contains(*marker))
        .map(|marker| format!("page contains '{}'", marker))
}

/// Live page source backed by reqwest
pub struct HttpFetcher {
    client: Client,
    user_agents: Vec<String>,
    retry: RetryPolicy,
    min_body_bytes: usize,
}

impl HttpFetcher {
    /// Creates a fetcher from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            user_agents: config.user_agents.clone(),
            retry: RetryPolicy::from_config(config),
            min_body_bytes: config.min_body_bytes,
        })
    }

    fn pick_user_agent(&self) -> Option<&str> {
        self.user_agents
            .choose(&mut rand::rng())
            .map(|ua| ua.as_str())
    }

    /// Performs a single GET attempt
    async fn fetch_once(&self, url: &Url) -> Result<String, FetchErrorKind> {
        let mut request = self.client.get(url.clone());
        if let Some(ua) = self.pick_user_agent() {
            request = request.header(USER_AGENT, ua);
        }

        let response = request.send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchErrorKind::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(classify_reqwest_error)?;

        if let Some(reason) = detect_block(&body, self.min_body_bytes) {
            return Err(FetchErrorKind::BlockedResponse(reason));
        }

        Ok(body)
    }
}

impl PageSource for HttpFetcher {
    /// Fetches a URL, retrying transient failures with linear backoff
    ///
    /// A permanent failure is returned immediately. When every attempt fails
    /// transiently the error is `RetriesExhausted` wrapping the last cause.
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let max_attempts = self.retry.max_attempts;
        let mut last = FetchErrorKind::Timeout;

        for attempt in 1..=max_attempts {
            tracing::debug!("GET {} (attempt {}/{})", url, attempt, max_attempts);

            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(kind) if !kind.is_transient() => {
                    tracing::warn!("Permanent failure fetching {}: {}", url, kind);
                    return Err(FetchError::new(url, kind));
                }
                Err(kind) => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        max_attempts,
                        url,
                        kind
                    );
                    last = kind;
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    }
                }
            }
        }

        Err(FetchError::new(
            url,
            FetchErrorKind::RetriesExhausted {
                attempts: max_attempts,
                last: Box::new(last),
            },
        ))
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> FetchErrorKind {
    if error.is_timeout() {
        FetchErrorKind::Timeout
    } else if let Some(status) = error.status() {
        FetchErrorKind::HttpStatus(status.as_u16())
    } else {
        FetchErrorKind::ConnectionFailed(error.to_string())
    }
}
