//! Configuration module for Crawly
//!
//! Every setting has a default, so a config file is optional. Values given on
//! the command line are applied on top of whatever was loaded here.
//!
//! # Example
//!
//! ```no_run
//! use crawly::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawly.toml")).unwrap();
//! println!("Crawling with {} workers", config.crawler.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, UserAgentConfig, DEFAULT_IGNORED_EXTENSIONS,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
