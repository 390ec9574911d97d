use url::Url;

/// Matches URLs whose path ends in one of the ignored file extensions
///
/// Matching is case-insensitive and looks at the path only, so
/// `/report.PDF` matches `pdf` while `/view?file=report.pdf` does not.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    /// Lowercased suffixes including the leading dot, e.g. `.pdf`
    suffixes: Vec<String>,
}

impl ExtensionFilter {
    /// Builds a filter from extensions given without the leading dot
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes = extensions
            .into_iter()
            .map(|ext| format!(".{}", ext.as_ref().trim_start_matches('.').to_lowercase()))
            .collect();

        Self { suffixes }
    }

    /// Returns true if the URL should be recorded as a leaf without fetching
    pub fn matches(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();
        self.suffixes.iter().any(|suffix| path.ends_with(suffix))
    }

    /// Same as [`matches`](Self::matches) for a URL string; unparseable input never matches
    pub fn matches_str(&self, url: &str) -> bool {
        Url::parse(url).map_or(false, |url| self.matches(&url))
    }

    /// Number of configured extensions
    pub fn len(&self) -> usize {
        self.suffixes.len()
    }

    /// Returns true if no extension is ignored
    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }
}
