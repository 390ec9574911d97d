//! HTML link extraction
//!
//! Anchors are read with `scraper`; each href is resolved against the page's
//! final URL, kept only if it stays inside the crawl boundary, and normalized
//! into the identity form used by the rest of the crawler.

use crate::url::{normalize_url, Domain, QueryPolicy};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Returns the raw `href` value of every `<a href>` in the document
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut hrefs = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                hrefs.push(href.to_string());
            }
        }
    }

    hrefs
}

/// Extracts the same-domain links of a page
///
/// # Rules
///
/// - Relative hrefs resolve against `page_url`
/// - Resolved URLs outside `domain` are dropped
/// - The fragment is stripped; the query string follows `policy`
/// - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only hrefs are skipped
///
/// # Example
///
/// ```
/// use crawly::crawler::extract_links;
/// use crawly::url::{Domain, QueryPolicy};
/// use url::Url;
///
/// let page = Url::parse("http://a.test/docs/").unwrap();
/// let domain = Domain::from_url(&page, true).unwrap();
/// let html = r#"<a href="intro.html#top">Intro</a><a href="http://ext.test/">Out</a>"#;
///
/// let links = extract_links(html, &page, &domain, QueryPolicy::Keep);
/// assert!(links.contains("http://a.test/docs/intro.html"));
/// assert_eq!(links.len(), 1);
/// ```
pub fn extract_links(
    html: &str,
    page_url: &Url,
    domain: &Domain,
    policy: QueryPolicy,
) -> HashSet<String> {
    extract_hrefs(html)
        .iter()
        .filter_map(|href| resolve_link(href, page_url))
        .filter(|url| domain.contains(url))
        .map(|url| normalize_url(&url, policy))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links (same page anchors)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url),
        _ => None,
    }
}
