//! Crawler coordinator - worker pool orchestration
//!
//! This module owns everything the workers share during a run:
//! - The frontier of pending jobs and its in-flight counter
//! - The dedup registry gating job submission
//! - The sitemap aggregator and crawled-pages set
//! - Counters for skipped and failed jobs
//!
//! Each worker gets its own [`Fetcher`], pulls jobs until the frontier drains,
//! and exits. Only after every worker has been joined is the sitemap read.

use crate::config::Config;
use crate::crawler::fetcher::{FetchResult, Fetcher, HttpFetcher};
use crate::crawler::frontier::{Frontier, InFlightGuard, Job};
use crate::crawler::parser::extract_links;
use crate::crawler::registry::DedupRegistry;
use crate::crawler::sitemap::{Sitemap, SitemapAggregator};
use crate::output::CrawlStatistics;
use crate::url::{normalize_url, Domain, ExtensionFilter, QueryPolicy};
use crate::{CrawlyError, Result};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Callback invoked by workers whenever they pick up a job
pub type ProgressCallback = Arc<dyn Fn(CrawlProgress) + Send + Sync>;

/// Point-in-time counters for the live progress display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlProgress {
    /// Jobs waiting in the frontier
    pub queue_size: usize,
    /// Distinct parents in the sitemap
    pub parent_urls: usize,
    /// Distinct URLs discovered (claimed) so far
    pub links_found: usize,
    /// Pages fetched with HTTP 200
    pub crawled_pages: usize,
}

impl fmt::Display for CrawlProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Queue size: {}, Parent urls: {}, Links found: {}, Crawled pages: {}",
            self.queue_size, self.parent_urls, self.links_found, self.crawled_pages
        )
    }
}

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The seed URL, which is also the root of the tree
    pub seed: String,
    /// Parent → children mapping
    pub sitemap: Sitemap,
    /// Pages that answered HTTP 200
    pub crawled_pages: HashSet<String>,
    /// Run counters
    pub statistics: CrawlStatistics,
}

/// State shared by all workers of one run
struct CrawlState {
    domain: Domain,
    query_policy: QueryPolicy,
    extensions: ExtensionFilter,
    frontier: Frontier,
    registry: DedupRegistry,
    sitemap: SitemapAggregator,
    ignored_leaves: AtomicUsize,
    transport_errors: AtomicUsize,
    http_errors: AtomicUsize,
    redirect_collisions: AtomicUsize,
    progress: Option<ProgressCallback>,
}

impl CrawlState {
    fn report_progress(&self) {
        if let Some(callback) = &self.progress {
            callback(CrawlProgress {
                queue_size: self.frontier.len(),
                parent_urls: self.sitemap.parent_count(),
                links_found: self.registry.len(),
                crawled_pages: self.sitemap.crawled_count(),
            });
        }
    }

    /// Runs one job to completion; child jobs are submitted before returning
    async fn process_job<F: Fetcher>(&self, fetcher: &F, job: &Job) {
        if self.extensions.matches_str(&job.child) {
            tracing::debug!("Recording {} as a leaf (ignored extension)", job.child);
            self.ignored_leaves.fetch_add(1, Ordering::Relaxed);
            if let Some(parent) = &job.parent {
                self.sitemap.record(parent, &job.child);
            }
            return;
        }

        tracing::debug!("Requesting {}", job.child);
        match fetcher.fetch(&job.child).await {
            FetchResult::Success {
                final_url,
                redirected,
                body,
                ..
            } => self.handle_page(job, &final_url, redirected, &body),

            FetchResult::HttpError { status_code } => {
                tracing::debug!("Skipping {} because of status={}", job.child, status_code);
                self.http_errors.fetch_add(1, Ordering::Relaxed);
            }

            FetchResult::NetworkError { error } => {
                tracing::warn!("Failed to request {}: {}", job.child, error);
                self.transport_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Records a page that answered 200 and schedules its unclaimed links
    fn handle_page(&self, job: &Job, final_url: &str, redirected: bool, body: &str) {
        let final_url = match Url::parse(final_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Unparseable final URL {} for {}: {}", final_url, job.child, e);
                self.transport_errors.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        // A same-domain redirect replaces the child with its destination. The
        // destination must be claimed too, or it could end up with two parents.
        // Off-domain redirects keep the original child.
        let mut page = job.child.clone();
        if redirected && self.domain.contains(&final_url) {
            let resolved = normalize_url(&final_url, self.query_policy);
            if resolved != job.child {
                if !self.registry.try_claim(&resolved) {
                    tracing::debug!(
                        "{} redirects to {}, which is already scheduled; dropping",
                        job.child,
                        resolved
                    );
                    self.redirect_collisions.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                tracing::debug!("{} redirected to {}", job.child, resolved);
                page = resolved;
            }
        } else if redirected {
            tracing::debug!(
                "{} redirected off-domain to {}; keeping original URL",
                job.child,
                final_url
            );
        }

        tracing::trace!("Adding {} to crawled pages", page);
        self.sitemap.mark_crawled(&page);

        let links = extract_links(body, &final_url, &self.domain, self.query_policy);

        if let Some(parent) = &job.parent {
            self.sitemap.record(parent, &page);
        }

        let mut submitted = 0;
        for link in links {
            if self.registry.try_claim(&link) {
                self.frontier.submit(Job::new(page.clone(), link));
                submitted += 1;
            }
        }

        tracing::trace!("{} yielded {} new jobs", page, submitted);
    }
}

/// Worker loop: take, process, complete, until the frontier drains
async fn run_worker<F: Fetcher>(
    id: usize,
    fetcher: F,
    state: Arc<CrawlState>,
    idle_timeout: Option<Duration>,
) -> usize {
    tracing::debug!("Worker {} started", id);
    let mut processed = 0;

    while let Some(job) = state.frontier.take_next(idle_timeout).await {
        let _in_flight = InFlightGuard::new(&state.frontier);
        state.report_progress();
        state.process_job(&fetcher, &job).await;
        processed += 1;
    }

    tracing::debug!("Worker {} exiting after {} jobs", id, processed);
    processed
}

/// Main crawler coordinator structure
pub struct Coordinator {
    seed: Url,
    config: Config,
    domain: Domain,
    progress: Option<ProgressCallback>,
}

impl Coordinator {
    /// Creates a coordinator for one crawl of `seed`
    ///
    /// The crawl boundary is derived from the seed.
    pub fn new(seed: Url, config: &Config) -> Result<Self> {
        let domain = Domain::from_url(&seed, config.crawler.match_scheme)?;

        Ok(Self {
            seed,
            config: config.clone(),
            domain,
            progress: None,
        })
    }

    /// Installs a progress callback invoked as workers pick up jobs
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// The crawl boundary
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Runs the crawl with one [`HttpFetcher`] per worker
    pub async fn run(self) -> Result<CrawlReport> {
        let config = self.config.clone();
        self.run_with(|_| HttpFetcher::new(&config).map_err(CrawlyError::from))
            .await
    }

    /// Runs the crawl, calling `make_fetcher` once per worker id
    ///
    /// All fetchers are built before any worker starts, so a construction
    /// failure aborts the run without leaving workers behind.
    pub async fn run_with<F, M>(self, mut make_fetcher: M) -> Result<CrawlReport>
    where
        F: Fetcher,
        M: FnMut(usize) -> Result<F>,
    {
        let start_time = Instant::now();
        let workers = self.config.crawler.max_workers.max(1);
        let idle_timeout = self.config.crawler.idle_timeout.map(Duration::from_secs);
        let seed = normalize_url(&self.seed, self.config.crawler.query_policy);

        let fetchers = (0..workers)
            .map(&mut make_fetcher)
            .collect::<Result<Vec<F>>>()?;

        let state = Arc::new(CrawlState {
            domain: self.domain,
            query_policy: self.config.crawler.query_policy,
            extensions: ExtensionFilter::new(&self.config.crawler.ignored_extensions),
            frontier: Frontier::new(),
            registry: DedupRegistry::new(),
            sitemap: SitemapAggregator::new(),
            ignored_leaves: AtomicUsize::new(0),
            transport_errors: AtomicUsize::new(0),
            http_errors: AtomicUsize::new(0),
            redirect_collisions: AtomicUsize::new(0),
            progress: self.progress,
        });

        tracing::info!(
            "Starting crawl of {} with {} worker(s) (domain: {})",
            seed,
            workers,
            state.domain.host()
        );

        state.registry.try_claim(&seed);
        state.frontier.submit(Job::seed(seed.clone()));

        let handles: Vec<_> = fetchers
            .into_iter()
            .enumerate()
            .map(|(id, fetcher)| {
                tokio::spawn(run_worker(id, fetcher, Arc::clone(&state), idle_timeout))
            })
            .collect();

        let mut failure = None;
        let mut jobs_processed = 0;
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(processed) => jobs_processed += processed,
                Err(e) => {
                    tracing::error!("Worker {} failed: {}", id, e);
                    failure.get_or_insert(CrawlyError::Worker {
                        id,
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        let links_found = state.registry.len();
        let ignored_leaves = state.ignored_leaves.load(Ordering::Relaxed);
        let transport_errors = state.transport_errors.load(Ordering::Relaxed);
        let http_errors = state.http_errors.load(Ordering::Relaxed);
        let redirect_collisions = state.redirect_collisions.load(Ordering::Relaxed);

        let (sitemap, crawled_pages) = match Arc::try_unwrap(state) {
            Ok(state) => state.sitemap.into_parts(),
            Err(shared) => shared.sitemap.snapshot(),
        };

        let statistics = CrawlStatistics {
            crawled_pages: crawled_pages.len(),
            parent_urls: sitemap.parent_count(),
            links_found,
            jobs_processed,
            ignored_leaves,
            transport_errors,
            http_errors,
            redirect_collisions,
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Crawl completed: {} pages crawled in {:?}",
            statistics.crawled_pages,
            statistics.elapsed
        );

        Ok(CrawlReport {
            seed,
            sitemap,
            crawled_pages,
            statistics,
        })
    }
}

/// Runs a complete crawl of `seed` with the HTTP fetcher
///
/// # Example
///
/// ```no_run
/// use crawly::config::Config;
/// use crawly::crawler::run_crawl;
/// use crawly::url::parse_seed;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let seed = parse_seed("example.com")?;
/// let report = run_crawl(seed, &Config::default()).await?;
/// println!("Crawled {} pages", report.crawled_pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(seed: Url, config: &Config) -> Result<CrawlReport> {
    Coordinator::new(seed, config)?.run().await
}
