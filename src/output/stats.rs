//! Crawl statistics and the end-of-run report
//!
//! Counters are collected by the coordinator while workers run and frozen
//! into [`CrawlStatistics`] once every worker has been joined.

use std::io::{self, Write};
use std::time::Duration;

/// Counters describing one finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Pages that answered HTTP 200
    pub crawled_pages: usize,

    /// Distinct parents in the sitemap
    pub parent_urls: usize,

    /// Distinct URLs claimed, the seed included
    pub links_found: usize,

    /// Jobs taken from the frontier by all workers
    pub jobs_processed: usize,

    /// Jobs recorded as leaves because of their extension
    pub ignored_leaves: usize,

    /// Jobs dropped on timeouts, connection or body errors
    pub transport_errors: usize,

    /// Jobs dropped on a non-200 status
    pub http_errors: usize,

    /// Jobs dropped because their redirect target was already scheduled
    pub redirect_collisions: usize,

    /// Wall time from seeding to the last worker exiting
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Jobs that produced nothing because of an error
    pub fn failed_jobs(&self) -> usize {
        self.transport_errors + self.http_errors
    }
}

/// Formats the closing summary lines
///
/// ```
/// use crawly::output::{format_summary, CrawlStatistics};
/// use std::time::Duration;
///
/// let stats = CrawlStatistics {
///     crawled_pages: 12,
///     elapsed: Duration::from_millis(1500),
///     ..Default::default()
/// };
/// assert_eq!(
///     format_summary("http://a.test/", &stats),
///     "http://a.test/ crawl completed in 1.50 seconds\nCrawled pages: 12"
/// );
/// ```
pub fn format_summary(seed: &str, stats: &CrawlStatistics) -> String {
    format!(
        "{} crawl completed in {:.2} seconds\nCrawled pages: {}",
        seed,
        stats.elapsed.as_secs_f64(),
        stats.crawled_pages
    )
}

/// Prints the closing summary to stdout
pub fn print_summary(seed: &str, stats: &CrawlStatistics) {
    println!("{}", format_summary(seed, stats));
}

/// Writes one URL per line, in whatever order `links` yields them
pub fn write_links<W, I>(out: &mut W, links: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    for link in links {
        writeln!(out, "{}", link.as_ref())?;
    }
    Ok(())
}

/// Prints a breakdown of the run counters, used at verbose levels
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Crawled pages: {}", stats.crawled_pages);
    println!("  Parent urls: {}", stats.parent_urls);
    println!("  Links found: {}", stats.links_found);
    println!("  Jobs processed: {}", stats.jobs_processed);
    println!();

    if stats.failed_jobs() > 0 || stats.ignored_leaves > 0 || stats.redirect_collisions > 0 {
        println!("Skipped:");
        println!("  Ignored extensions: {}", stats.ignored_leaves);
        println!("  HTTP errors: {}", stats.http_errors);
        println!("  Transport errors: {}", stats.transport_errors);
        println!("  Redirect collisions: {}", stats.redirect_collisions);
        println!();
    }
}
