//! Link extraction
//!
//! The crawl engine only needs the [`LinkExtractor`] contract: given raw
//! document bytes and a base URL, return the page title and the absolute
//! URLs it links to. [`HtmlLinkExtractor`] is the default implementation.

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from a hypertext document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// All links found on the page, resolved against the base URL
    pub links: Vec<Url>,
}

/// Turns a fetched document into a title and a list of absolute links
///
/// Implementations must not fail: malformed input yields an empty page.
pub trait LinkExtractor: Send + Sync {
    fn extract(&self, document: &[u8], base_url: &Url) -> ParsedPage;
}

/// HTML link extractor backed by `scraper`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, document: &[u8], base_url: &Url) -> ParsedPage {
        let html = String::from_utf8_lossy(document);
        parse_html(&html, base_url)
    }
}

/// Parses HTML content and extracts links and the title
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to HTTP(S)
///
/// # Example
///
/// ```
/// use ripple_crawler::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(link) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                links.push(link);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(link) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                links.push(link);
            }
        }
    }

    links
}

/// Resolves an href against the base URL, or None if it should be skipped
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    fn link_strings(parsed: &ParsedPage) -> Vec<&str> {
        parsed.links.iter().map(Url::as_str).collect()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let parsed = parse_html("<html><head></head><body></body></html>", &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_extract_relative_and_absolute_links() {
        let html = r#"<html><body>
            <a href="/other">A</a>
            <a href="sibling">B</a>
            <a href="https://other.com/page">C</a>
        </body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(
            link_strings(&parsed),
            vec![
                "https://example.com/other",
                "https://example.com/sibling",
                "https://other.com/page"
            ]
        );
    }

    #[test]
    fn test_skip_non_navigational_links() {
        let html = r##"<html><body>
            <a href="javascript:void(0)">js</a>
            <a href="mailto:test@example.com">mail</a>
            <a href="tel:+1234567890">tel</a>
            <a href="data:text/html,<h1>x</h1>">data</a>
            <a href="#section">anchor</a>
            <a href="/file.pdf" download>download</a>
            <a href="ftp://example.com/file">ftp</a>
            <a href="">empty</a>
        </body></html>"##;
        let parsed = parse_html(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_extract_canonical_link() {
        let html = r#"<html><head><link rel="canonical" href="https://example.com/canonical" /></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(link_strings(&parsed), vec!["https://example.com/canonical"]);
    }

    #[test]
    fn test_extractor_handles_invalid_utf8() {
        let mut bytes = b"<html><head><title>Bytes</title></head><body><a href=\"/x\">x</a>".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        let parsed = HtmlLinkExtractor.extract(&bytes, &base_url());
        assert_eq!(parsed.title.as_deref(), Some("Bytes"));
        assert_eq!(link_strings(&parsed), vec!["https://example.com/x"]);
    }

    #[test]
    fn test_malformed_markup_yields_no_links() {
        let parsed = HtmlLinkExtractor.extract(b"<<<not html at all", &base_url());
        assert!(parsed.links.is_empty());
    }
}
