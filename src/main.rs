//! Crawly main entry point
//!
//! This is the command-line interface for the Crawly sitemap generator.

use anyhow::{Context, Result};
use clap::Parser;
use crawly::config::{load_config_with_hash, validate, Config};
use crawly::crawler::{Coordinator, CrawlReport};
use crawly::output::{
    build_tree, print_statistics, print_summary, progress_callback, progress_spinner, write_links,
};
use crawly::parse_seed;
use crawly::QueryPolicy;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Crawly: a single-domain sitemap generator
///
/// Crawly starts from a seed URL, follows every same-origin link it finds,
/// and prints the site as a tree rooted at the seed.
#[derive(Parser, Debug)]
#[command(name = "crawly")]
#[command(version = "1.0.0")]
#[command(about = "A single-domain sitemap generator", long_about = None)]
struct Cli {
    /// Seed URL or bare domain to start crawling from
    #[arg(short, long)]
    url: String,

    /// Number of concurrent workers
    #[arg(long, value_name = "N")]
    max_workers: Option<usize>,

    /// Print the sitemap tree when the crawl finishes
    #[arg(long, overrides_with = "no_print_tree")]
    print_tree: bool,

    /// Do not print the sitemap tree
    #[arg(long, overrides_with = "print_tree")]
    no_print_tree: bool,

    /// Print every crawled page, one per line
    #[arg(long)]
    print_links: bool,

    /// Treat URLs differing only in their query string as the same page
    #[arg(long)]
    strip_query: bool,

    /// Compare only the host when deciding whether a link stays on the site,
    /// so an http:// seed can follow its own https:// pages
    #[arg(long)]
    host_only: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    request_timeout: Option<u64>,

    /// Hide the live progress line
    #[arg(long)]
    no_progress: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(workers) = self.max_workers {
            config.crawler.max_workers = workers;
        }
        if let Some(timeout) = self.request_timeout {
            config.crawler.request_timeout = timeout;
        }
        if self.strip_query {
            config.crawler.query_policy = QueryPolicy::Strip;
        }
        if self.host_only {
            config.crawler.match_scheme = false;
        }
        if self.print_tree {
            config.output.print_tree = true;
        }
        if self.no_print_tree {
            config.output.print_tree = false;
        }
        if self.print_links {
            config.output.print_links = true;
        }
        if self.no_progress || self.quiet {
            config.output.progress = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply(&mut config);
    validate(&config).context("Invalid configuration")?;

    let seed = parse_seed(&cli.url).with_context(|| format!("Invalid seed URL: {}", cli.url))?;

    let report = handle_crawl(seed, &config).await?;
    print_report(&report, &config, cli.verbose)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawly=info,warn"),
            1 => EnvFilter::new("crawly=debug,info"),
            2 => EnvFilter::new("crawly=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the main crawl operation
async fn handle_crawl(seed: url::Url, config: &Config) -> Result<CrawlReport> {
    let mut coordinator = Coordinator::new(seed, config)?;

    let spinner = config.output.progress.then(progress_spinner);
    if let Some(pb) = &spinner {
        coordinator = coordinator.with_progress(progress_callback(pb.clone()));
    }

    let result = coordinator.run().await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match result {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            Ok(report)
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Prints the tree, the link list and the summary to stdout
fn print_report(report: &CrawlReport, config: &Config, verbose: u8) -> Result<()> {
    // Built even when not printed, so a broken sitemap always fails the run
    let tree = build_tree(&report.seed, &report.sitemap)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "\n")?;

    if config.output.print_tree {
        tree.write_to(&mut out)?;
        writeln!(out)?;
    }

    if config.output.print_links {
        write_links(&mut out, &report.crawled_pages)?;
        writeln!(out)?;
    }

    out.flush()?;
    drop(out);

    if verbose > 0 {
        print_statistics(&report.statistics);
    }

    print_summary(&report.seed, &report.statistics);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "crawly",
            "--url",
            "a.test",
            "--max-workers",
            "8",
            "--no-print-tree",
            "--print-links",
            "--strip-query",
            "--request-timeout",
            "5",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.crawler.max_workers, 8);
        assert_eq!(config.crawler.request_timeout, 5);
        assert_eq!(config.crawler.query_policy, QueryPolicy::Strip);
        assert!(config.crawler.match_scheme);
        assert!(!config.output.print_tree);
        assert!(config.output.print_links);
        assert!(config.output.progress);
    }

    #[test]
    fn test_cli_defaults_leave_config_untouched() {
        let cli = Cli::parse_from(["crawly", "-u", "http://a.test/"]);
        let mut config = Config::default();
        config.output.print_tree = false;
        cli.apply(&mut config);

        assert_eq!(config.crawler.max_workers, 1);
        assert!(!config.output.print_tree);
        assert!(!config.output.print_links);
    }

    #[test]
    fn test_last_tree_flag_wins() {
        let cli = Cli::parse_from(["crawly", "-u", "a.test", "--no-print-tree", "--print-tree"]);
        let mut config = Config::default();
        config.output.print_tree = false;
        cli.apply(&mut config);
        assert!(config.output.print_tree);
    }

    #[test]
    fn test_host_only_disables_scheme_match() {
        let cli = Cli::parse_from(["crawly", "-u", "a.test", "--host-only"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert!(!config.crawler.match_scheme);
    }

    #[test]
    fn test_quiet_hides_progress() {
        let cli = Cli::parse_from(["crawly", "-u", "a.test", "-q"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert!(!config.output.progress);
    }

    #[test]
    fn test_url_required() {
        assert!(Cli::try_parse_from(["crawly"]).is_err());
    }
}
