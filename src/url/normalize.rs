use serde::Deserialize;
use url::Url;

/// How query strings take part in URL identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPolicy {
    /// `/page?a=1` and `/page?a=2` are different pages
    #[default]
    Keep,
    /// The query string is dropped, so both collapse to `/page`
    Strip,
}

/// Normalizes an absolute URL into the identity key used across the crawl
///
/// # Normalization Steps
///
/// 1. Remove the fragment (everything after #)
/// 2. Remove the query string when the policy is [`QueryPolicy::Strip`]
///
/// Everything else is left exactly as the `url` crate parsed it: scheme and
/// host are already lowercased by the parser and the path is kept verbatim.
///
/// # Examples
///
/// ```
/// use crawly::url::{normalize_url, QueryPolicy};
/// use url::Url;
///
/// let url = Url::parse("http://a.test/page?x=1#top").unwrap();
/// assert_eq!(normalize_url(&url, QueryPolicy::Keep), "http://a.test/page?x=1");
/// assert_eq!(normalize_url(&url, QueryPolicy::Strip), "http://a.test/page");
/// ```
pub fn normalize_url(url: &Url, policy: QueryPolicy) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    if policy == QueryPolicy::Strip {
        url.set_query(None);
    }

    url.into()
}
