//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier and the dedup registry
//! - HTTP fetching and link extraction
//! - Sitemap aggregation
//! - The worker pool that ties them together

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod registry;
mod sitemap;

pub use coordinator::{run_crawl, Coordinator, CrawlProgress, CrawlReport, ProgressCallback};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher, HttpFetcher};
pub use frontier::{Frontier, Job};
pub use parser::{extract_hrefs, extract_links};
pub use registry::DedupRegistry;
pub use sitemap::{Sitemap, SitemapAggregator};

use crate::config::Config;
use crate::url::parse_seed;
use crate::CrawlyError;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Parse the seed (bare domains get `http://`)
/// 2. Derive the crawl boundary from the seed
/// 3. Start the worker pool, one HTTP client per worker
/// 4. Fetch pages, extract links and schedule unseen ones
/// 5. Return the sitemap once every worker has finished
///
/// # Arguments
///
/// * `seed` - The seed URL or bare domain
/// * `config` - The crawler configuration
pub async fn crawl(seed: &str, config: &Config) -> Result<CrawlReport, CrawlyError> {
    let seed = parse_seed(seed)?;
    run_crawl(seed, config).await
}

/// Locks a mutex, recovering the data if another worker panicked while holding it
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
