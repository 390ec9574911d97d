//! Crawly: a single-domain sitemap generator
//!
//! This crate crawls every page reachable from a seed URL on the same origin,
//! records which page first linked to which, and turns the result into a tree.

pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Crawly operations
#[derive(Debug, Error)]
pub enum CrawlyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Sitemap invariant violated: {url} linked from both {first_parent} and {second_parent}")]
    InvariantViolation {
        url: String,
        first_parent: String,
        second_parent: String,
    },

    #[error("Worker {id} failed: {message}")]
    Worker { id: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Crawly operations
pub type Result<T> = std::result::Result<T, CrawlyError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlReport};
pub use output::{build_tree, SitemapTree};
pub use crate::url::{normalize_url, parse_seed, Domain, QueryPolicy};
