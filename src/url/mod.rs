//! URL handling module for Crawly
//!
//! This module provides seed parsing, the same-origin crawl boundary,
//! identity normalization and the ignored-extension matcher.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{parse_seed, Domain};
pub use matcher::ExtensionFilter;
pub use normalize::{normalize_url, QueryPolicy};
