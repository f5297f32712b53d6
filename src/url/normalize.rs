use crate::UrlError;
use url::Url;

/// Parses a URL that must be absolute and hierarchical
///
/// Rejects relative references, `mailto:`-style URLs without a host, and any
/// scheme other than HTTP(S).
///
/// # Examples
///
/// ```
/// use ripple_crawler::url::parse_absolute;
///
/// assert!(parse_absolute("https://a.test/").is_ok());
/// assert!(parse_absolute("/relative/path").is_err());
/// assert!(parse_absolute("ftp://a.test/").is_err());
/// ```
pub fn parse_absolute(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim())?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(normalize_url(url))
}

/// Normalizes a URL for deduplication
///
/// Only the fragment is dropped: `/a#top` and `/a` name the same document.
/// Scheme and host case are already canonicalized by the parser.
pub fn normalize_url(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
