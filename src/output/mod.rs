//! Output module for rendering crawl results
//!
//! This module provides:
//! - The sitemap tree builder and its text rendering
//! - The end-of-run summary and link list
//! - The live progress spinner

mod progress;
mod stats;
mod tree;

pub use progress::{progress_callback, progress_spinner};
pub use stats::{format_summary, print_statistics, print_summary, write_links, CrawlStatistics};
pub use tree::{build_tree, SitemapTree, TreeNode};
