//! HTML link discovery
//!
//! This module handles:
//! - Resolving the page's base URL (`<base href>` or the fetched URL)
//! - Pulling every anchor href out of a document and resolving it to an
//!   absolute HTTP(S) URL

use scraper::{Html, Selector};
use url::Url;

/// Returns the URL relative links on this page resolve against
///
/// A `<base href="...">` element wins when present and resolvable; otherwise the
/// page's own URL is used.
pub fn base_url(document: &Html, page_url: &Url) -> Url {
    let Ok(selector) = Selector::parse("base[href]") else {
        return page_url.clone();
    };

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Extracts all followable links from the document
///
/// Every `<a href>` is resolved against `base_url`. Links that do not resolve
/// to an `http`/`https` URL (`javascript:`, `mailto:`, `tel:`, data URIs) and
/// fragment-only links are dropped. Order follows the document; duplicates are
/// kept since the frontier dedups.
///
/// # Example
///
/// ```
/// use knowledge_harvester::crawler::extract_links;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<a href="/courses">Courses</a><a href="mailto:x@y.in">Mail</a>"#);
/// let base = Url::parse("https://example.ac.in/").unwrap();
/// assert_eq!(extract_links(&html, &base), vec!["https://example.ac.in/courses".to_string()]);
/// ```
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
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
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
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

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
