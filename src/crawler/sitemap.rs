//! Sitemap aggregation
//!
//! [`Sitemap`] is the plain parent→children mapping. [`SitemapAggregator`] is
//! the shared, lock-protected owner of the sitemap and of the set of crawled
//! pages that workers write into while the crawl runs.

use super::lock;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Parent URL → child URLs, with parents kept in the order they first appeared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sitemap {
    order: Vec<String>,
    children: HashMap<String, Vec<String>>,
}

impl Sitemap {
    /// Creates an empty sitemap
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `child` to the list under `parent`, creating the entry if needed
    pub fn record(&mut self, parent: &str, child: &str) {
        match self.children.get_mut(parent) {
            Some(list) => list.push(child.to_string()),
            None => {
                self.order.push(parent.to_string());
                self.children
                    .insert(parent.to_string(), vec![child.to_string()]);
            }
        }
    }

    /// Children recorded under `parent`, in insertion order
    pub fn children(&self, parent: &str) -> Option<&[String]> {
        self.children.get(parent).map(Vec::as_slice)
    }

    /// Returns whether `parent` has an entry
    pub fn contains_parent(&self, parent: &str) -> bool {
        self.children.contains_key(parent)
    }

    /// Iterates entries in the order parents were first recorded
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order.iter().map(move |parent| {
            let children = self
                .children
                .get(parent)
                .map(Vec::as_slice)
                .unwrap_or_default();
            (parent.as_str(), children)
        })
    }

    /// Parent URLs in first-recorded order
    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of distinct parents
    pub fn parent_count(&self) -> usize {
        self.order.len()
    }

    /// Total number of recorded (parent, child) pairs
    pub fn link_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    /// Returns whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Default)]
struct Aggregate {
    sitemap: Sitemap,
    crawled: HashSet<String>,
}

/// Shared writer for the sitemap and the crawled-pages set
///
/// Workers only write; the contents are handed out once by
/// [`into_parts`](Self::into_parts) after the pool has finished.
#[derive(Debug, Default)]
pub struct SitemapAggregator {
    inner: Mutex<Aggregate>,
}

impl SitemapAggregator {
    /// Creates an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `child` was discovered on `parent`
    pub fn record(&self, parent: &str, child: &str) {
        lock(&self.inner).sitemap.record(parent, child);
    }

    /// Adds `url` to the crawled pages; returns false if it was already there
    pub fn mark_crawled(&self, url: &str) -> bool {
        lock(&self.inner).crawled.insert(url.to_string())
    }

    /// Number of distinct parents recorded so far
    pub fn parent_count(&self) -> usize {
        lock(&self.inner).sitemap.parent_count()
    }

    /// Number of pages crawled so far
    pub fn crawled_count(&self) -> usize {
        lock(&self.inner).crawled.len()
    }

    /// Consumes the aggregator, returning the sitemap and crawled pages
    pub fn into_parts(self) -> (Sitemap, HashSet<String>) {
        let aggregate = self
            .inner
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        (aggregate.sitemap, aggregate.crawled)
    }

    /// Copies the current contents without consuming the aggregator
    pub fn snapshot(&self) -> (Sitemap, HashSet<String>) {
        let aggregate = lock(&self.inner);
        (aggregate.sitemap.clone(), aggregate.crawled.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_creates_entry() {
        let mut sitemap = Sitemap::new();
        sitemap.record("http://a.test/", "http://a.test/b.html");

        assert!(sitemap.contains_parent("http://a.test/"));
        assert_eq!(
            sitemap.children("http://a.test/"),
            Some(&["http://a.test/b.html".to_string()][..])
        );
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut sitemap = Sitemap::new();
        sitemap.record("http://a.test/", "http://a.test/z");
        sitemap.record("http://a.test/", "http://a.test/a");
        sitemap.record("http://a.test/", "http://a.test/m");

        assert_eq!(
            sitemap.children("http://a.test/").unwrap(),
            &["http://a.test/z", "http://a.test/a", "http://a.test/m"]
        );
    }

    #[test]
    fn test_duplicates_within_parent_kept() {
        let mut sitemap = Sitemap::new();
        sitemap.record("http://a.test/", "http://a.test/b");
        sitemap.record("http://a.test/", "http://a.test/b");

        assert_eq!(sitemap.children("http://a.test/").unwrap().len(), 2);
        assert_eq!(sitemap.link_count(), 2);
    }

    #[test]
    fn test_parent_order() {
        let mut sitemap = Sitemap::new();
        sitemap.record("http://a.test/", "http://a.test/b");
        sitemap.record("http://a.test/b", "http://a.test/c");
        sitemap.record("http://a.test/", "http://a.test/d");

        let parents: Vec<_> = sitemap.parents().collect();
        assert_eq!(parents, vec!["http://a.test/", "http://a.test/b"]);
        assert_eq!(sitemap.parent_count(), 2);

        let entries: Vec<_> = sitemap.iter().map(|(p, c)| (p, c.len())).collect();
        assert_eq!(entries, vec![("http://a.test/", 2), ("http://a.test/b", 1)]);
    }

    #[test]
    fn test_empty_sitemap() {
        let sitemap = Sitemap::new();
        assert!(sitemap.is_empty());
        assert_eq!(sitemap.children("http://a.test/"), None);
        assert_eq!(sitemap.link_count(), 0);
    }

    #[test]
    fn test_mark_crawled_once() {
        let aggregator = SitemapAggregator::new();
        assert!(aggregator.mark_crawled("http://a.test/"));
        assert!(!aggregator.mark_crawled("http://a.test/"));
        assert_eq!(aggregator.crawled_count(), 1);
    }

    #[test]
    fn test_into_parts() {
        let aggregator = SitemapAggregator::new();
        aggregator.mark_crawled("http://a.test/b");
        aggregator.record("http://a.test/", "http://a.test/b");

        let (sitemap, crawled) = aggregator.into_parts();
        assert_eq!(sitemap.parent_count(), 1);
        assert!(crawled.contains("http://a.test/b"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_not_lost() {
        let aggregator = Arc::new(SitemapAggregator::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let aggregator = Arc::clone(&aggregator);
                tokio::spawn(async move {
                    for i in 0..100 {
                        aggregator.record(
                            &format!("http://a.test/p{}", i % 5),
                            &format!("http://a.test/w{}/{}", worker, i),
                        );
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let (sitemap, _) = aggregator.snapshot();
        assert_eq!(sitemap.parent_count(), 5);
        assert_eq!(sitemap.link_count(), 800);
    }
}
