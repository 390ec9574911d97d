use crate::UrlError;
use url::Url;

/// The crawl boundary: scheme, host and port of the seed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    scheme: String,
    host: String,
    port: Option<u16>,
    match_scheme: bool,
}

impl Domain {
    /// Builds the boundary from the seed URL
    ///
    /// With `match_scheme` off only the host is compared, so an `http://` seed
    /// can follow its own redirect to `https://`.
    pub fn from_url(url: &Url, match_scheme: bool) -> Result<Self, UrlError> {
        let host = url.host_str().ok_or(UrlError::MissingDomain)?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_lowercase(),
            port: url.port_or_known_default(),
            match_scheme,
        })
    }

    /// Returns true if `url` lies inside the boundary
    pub fn contains(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };

        if !host.eq_ignore_ascii_case(&self.host) {
            return false;
        }

        if !self.match_scheme {
            return url.scheme() == "http" || url.scheme() == "https";
        }

        url.scheme() == self.scheme && url.port_or_known_default() == self.port
    }

    /// Host part of the boundary
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Turns user input into the seed URL
///
/// Input without a `scheme://` prefix gets `http://` prepended, so bare
/// domains like `example.com` work. The fragment is dropped.
///
/// # Examples
///
/// ```
/// use crawly::url::parse_seed;
///
/// let url = parse_seed("example.com").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/");
/// ```
pub fn parse_seed(input: &str) -> Result<Url, UrlError> {
    let input = input.trim();
    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{}", input)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}
