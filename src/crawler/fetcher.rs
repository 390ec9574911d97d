//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building one HTTP client per worker with the identifying user agent
//! - Request and connect timeouts
//! - Following redirects and reporting the final URL
//! - Classifying the outcome for the worker

use crate::config::Config;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::future::Future;
use std::time::Duration;

/// Maximum number of redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The page answered HTTP 200
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Whether at least one redirect was followed
        redirected: bool,
        /// Page body content
        body: String,
    },

    /// Any status other than 200; the body is not read
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (DNS failure, connection refused, timeout, broken body)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// The fetch capability used by workers
///
/// Each worker owns its own fetcher, so implementations do not need to share
/// connections across workers.
pub trait Fetcher: Send + Sync + 'static {
    /// Fetches `url`, following redirects
    fn fetch(&self, url: &str) -> impl Future<Output = FetchResult> + Send;
}

/// [`Fetcher`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher with a fresh client configured from `config`
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = FetchResult> + Send {
        fetch_url(&self.client, url)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use crawly::config::Config;
/// use crawly::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.value.as_str())
        .timeout(Duration::from_secs(config.crawler.request_timeout))
        .connect_timeout(Duration::from_secs(config.crawler.connect_timeout))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 200 | `Success` with the body |
/// | Any other status | `HttpError` |
/// | Timeout, connect or DNS failure, redirect limit | `NetworkError` |
/// | Body could not be read | `NetworkError` |
///
/// No retries are attempted.
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if status != StatusCode::OK {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();
    let redirected = final_url != url;

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            redirected,
            body,
        },
        Err(e) => FetchResult::NetworkError {
            error: format!("Failed to read body: {}", e),
        },
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_redirect() {
        format!("Redirect error: {}", e)
    } else {
        e.to_string()
    };

    FetchResult::NetworkError { error }
}
