use url::{Origin, Url};

/// Extracts the lowercase host from a URL
///
/// This is the key used for per-host slow tracking. The port is not part of
/// it, so `example.com:8080` and `example.com` share one entry.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_crawler::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `url` has the given scheme+host+port origin
///
/// Opaque origins (e.g. `data:` URLs) never match anything, including
/// themselves.
pub fn is_same_origin(url: &Url, origin: &Origin) -> bool {
    origin.is_tuple() && url.origin() == *origin
}
