use super::lock;
use std::collections::HashSet;
use std::sync::Mutex;

/// Set of every URL ever scheduled during a run
///
/// A URL is claimed exactly once; only the caller that wins the claim may
/// submit it to the frontier. This is what keeps the crawl finite and gives
/// each page a single parent in the sitemap.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    claimed: Mutex<HashSet<String>>,
}

impl DedupRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url` and returns true the first time it is seen, false afterwards
    ///
    /// The check and the insert happen under one lock, so two concurrent
    /// callers can never both win the same URL.
    pub fn try_claim(&self, url: &str) -> bool {
        let mut claimed = lock(&self.claimed);
        if claimed.contains(url) {
            return false;
        }
        claimed.insert(url.to_string())
    }

    /// Returns whether `url` has been claimed
    pub fn contains(&self, url: &str) -> bool {
        lock(&self.claimed).contains(url)
    }

    /// Number of distinct URLs claimed so far
    pub fn len(&self) -> usize {
        lock(&self.claimed).len()
    }

    /// Returns whether nothing has been claimed yet
    pub fn is_empty(&self) -> bool {
        lock(&self.claimed).is_empty()
    }
}
