use crate::url::QueryPolicy;
use serde::Deserialize;

/// File extensions that are recorded as sitemap leaves but never fetched
pub const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpeg", "jpg", "doc", "docx", "xls", "xlsx", "zip", "tar", "gz", "gif", "exe",
    "mov", "avi", "tiff", "bmp", "mpg", "mp4", "swf", "wmv",
];

/// Identifying header sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 Crawly";

/// Main configuration structure for Crawly
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Whole-request timeout for a single fetch (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// TCP connect timeout (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,

    /// How long an idle worker waits for new work before giving up (seconds).
    ///
    /// Unset means workers only stop once the frontier has drained.
    #[serde(rename = "idle-timeout")]
    pub idle_timeout: Option<u64>,

    /// Whether query strings are part of a URL's identity
    #[serde(rename = "query-policy")]
    pub query_policy: QueryPolicy,

    /// Compare scheme as well as host when checking the crawl boundary
    #[serde(rename = "match-scheme")]
    pub match_scheme: bool,

    /// Extensions (without the dot) that are never fetched
    #[serde(rename = "ignored-extensions")]
    pub ignored_extensions: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_workers: 1,
            request_timeout: 30,
            connect_timeout: 10,
            idle_timeout: None,
            query_policy: QueryPolicy::Keep,
            match_scheme: true,
            ignored_extensions: DEFAULT_IGNORED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Value of the `User-Agent` header
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Render the sitemap tree once the crawl finishes
    #[serde(rename = "print-tree")]
    pub print_tree: bool,

    /// Print every crawled page, unordered
    #[serde(rename = "print-links")]
    pub print_links: bool,

    /// Show the live progress line while crawling
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            print_tree: true,
            print_links: false,
            progress: true,
        }
    }
}
