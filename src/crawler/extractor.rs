//! Structured page extraction
//!
//! Turns a parsed document into a [`PageRecord`]: title, meta description,
//! headings, content paragraphs, table rows and media links with the text of
//! the paragraph around them. Extraction never fails; anything missing from
//! the document simply comes back empty.

use crate::url::extract_domain;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Selector for the main content region, tried in document order
const MAIN_REGION_SELECTOR: &str = "main, article, [role=\"main\"], #content, .content, \
     #main-content, .main-content, #main, .main";

/// Elements whose text counts as paragraph content
const PARAGRAPH_SELECTOR: &str = "p, li";

const HEADING_SELECTOR: &str = "h1, h2, h3, h4";

/// A media or download link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLink {
    /// Absolute link target
    pub url: String,

    /// Text of the nearest enclosing paragraph, empty if there is none
    pub context: String,
}

/// One extracted page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// The URL the page was fetched from (after redirects)
    pub url: String,

    /// Lowercase host of `url`
    pub domain: String,

    pub title: Option<String>,
    pub meta_description: Option<String>,

    /// Heading text (levels 1-4), unique, in document order
    pub headings: Vec<String>,

    /// Paragraph text longer than the minimum length, unique, in document order
    pub paragraphs: Vec<String>,

    /// Table rows with cells joined by `" | "`
    pub table_rows: Vec<String>,

    pub media_links: Vec<MediaLink>,
}

/// Extracts page records from parsed documents
#[derive(Debug, Clone)]
pub struct Extractor {
    min_paragraph_length: usize,
    media_markers: Vec<String>,
}

impl Extractor {
    /// Creates an extractor
    ///
    /// * `min_paragraph_length` - paragraphs must be strictly longer than this
    /// * `media_markers` - substrings (matched case-insensitively) identifying media hrefs
    pub fn new<S: AsRef<str>>(min_paragraph_length: usize, media_markers: &[S]) -> Self {
        Self {
            min_paragraph_length,
            media_markers: media_markers
                .iter()
                .map(|m| m.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Builds the record for `document`, fetched from `source_url`
    ///
    /// `base_url` is what relative media links resolve against.
    pub fn extract(&self, document: &Html, source_url: &Url, base_url: &Url) -> PageRecord {
        PageRecord {
            url: source_url.to_string(),
            domain: extract_domain(source_url).unwrap_or_default(),
            title: extract_title(document),
            meta_description: extract_meta_description(document),
            headings: extract_headings(document),
            paragraphs: self.extract_paragraphs(document),
            table_rows: extract_table_rows(document),
            media_links: self.extract_media_links(document, base_url),
        }
    }

    fn extract_paragraphs(&self, document: &Html) -> Vec<String> {
        let Ok(paragraph_selector) = Selector::parse(PARAGRAPH_SELECTOR) else {
            return Vec::new();
        };

        let keep = |text: &String| text.chars().count() > self.min_paragraph_length;

        // With a main region present, text outside it is never content
        match main_region(document) {
            Some(region) => dedup_texts(region.select(&paragraph_selector).map(element_text), keep),
            None => dedup_texts(document.select(&paragraph_selector).map(element_text), keep),
        }
    }

    fn extract_media_links(&self, document: &Html, base_url: &Url) -> Vec<MediaLink> {
        let Ok(a_selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut media = Vec::new();
        for anchor in document.select(&a_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if !self.is_media_href(href) {
                continue;
            }
            let Ok(url) = base_url.join(href) else {
                tracing::debug!("Skipping unresolvable media link {:?}", href);
                continue;
            };
            media.push(MediaLink {
                url: url.to_string(),
                context: paragraph_context(anchor),
            });
        }
        media
    }

    fn is_media_href(&self, href: &str) -> bool {
        let href = href.to_lowercase();
        self.media_markers
            .iter()
            .any(|marker| href.contains(marker.as_str()))
    }
}

/// Heading and paragraph text of the whole document, for relevance checks
pub fn page_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("h1, h2, h3, h4, p") else {
        return String::new();
    };
    document
        .select(&selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `<title>` text
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// First `<meta name="description">` content
fn extract_meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name=\"description\"]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

fn extract_headings(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(HEADING_SELECTOR) else {
        return Vec::new();
    };
    dedup_texts(document.select(&selector).map(element_text), |_| true)
}

fn extract_table_rows(document: &Html) -> Vec<String> {
    let Ok(row_selector) = Selector::parse("table tr") else {
        return Vec::new();
    };

    document
        .select(&row_selector)
        .filter_map(|row| {
            // Direct cells only; nested tables yield their own rows
            let cells: Vec<String> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(element_text)
                .collect();
            if cells.is_empty() {
                None
            } else {
                Some(cells.join(" | "))
            }
        })
        .collect()
}

/// The first main-content container in document order, if any
fn main_region(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse(MAIN_REGION_SELECTOR).ok()?;
    document.select(&selector).next()
}

/// Text of the nearest `<p>` ancestor of `anchor`, or empty
fn paragraph_context(anchor: ElementRef<'_>) -> String {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "p")
        .map(element_text)
        .unwrap_or_default()
}

/// All descendant text with whitespace runs collapsed to single spaces
fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drops empty entries and entries failing `keep`, then duplicates, preserving
/// the first occurrence
fn dedup_texts<I, F>(texts: I, keep: F) -> Vec<String>
where
    I: Iterator<Item = String>,
    F: Fn(&String) -> bool,
{
    let mut seen = HashSet::new();
    texts
        .filter(|text| !text.is_empty() && keep(text))
        .filter(|text| seen.insert(text.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(20, crate::config::DEFAULT_MEDIA_MARKERS)
    }

    fn extract(html: &str) -> PageRecord {
        let url = Url::parse("https://example.ac.in/programs/index.html").unwrap();
        let document = Html::parse_document(html);
        extractor().extract(&document, &url, &url)
    }

    const LONG_A: &str = "The ministry funds research fellowships for doctoral students.";
    const LONG_B: &str = "Applications for the national scholarship scheme open in July.";

    #[test]
    fn test_title_and_meta_description() {
        let record = extract(
            r#"<html><head><title>  Higher Education  </title>
               <meta name="description" content="Schemes and programs"></head><body></body></html>"#,
        );
        assert_eq!(record.title.as_deref(), Some("Higher Education"));
        assert_eq!(record.meta_description.as_deref(), Some("Schemes and programs"));
        assert_eq!(record.domain, "example.ac.in");
        assert_eq!(record.url, "https://example.ac.in/programs/index.html");
    }

    #[test]
    fn test_missing_elements_are_absent_not_errors() {
        let record = extract("<html><body></body></html>");
        assert_eq!(record.title, None);
        assert_eq!(record.meta_description, None);
        assert!(record.headings.is_empty());
        assert!(record.paragraphs.is_empty());
        assert!(record.table_rows.is_empty());
        assert!(record.media_links.is_empty());
    }

    #[test]
    fn test_malformed_html_still_produces_record() {
        let record = extract("<html><body><h1>Admissions</h1><p>unclosed <table><tr><td>x");
        assert_eq!(record.headings, vec!["Admissions"]);
    }

    #[test]
    fn test_headings_in_order_deduplicated() {
        let record = extract(
            "<h1>Overview</h1><h3> Fees </h3><h2>Overview</h2><h4>  </h4><h5>Ignored</h5><h2>Contact</h2>",
        );
        assert_eq!(record.headings, vec!["Overview", "Fees", "Contact"]);
    }

    #[test]
    fn test_short_paragraphs_dropped() {
        let html = format!(
            "<h2>Education Policy</h2><p>Fifteen chars!!</p><p>{}</p>",
            "x".repeat(120)
        );
        let record = extract(&html);
        assert_eq!(record.paragraphs, vec!["x".repeat(120)]);
    }

    #[test]
    fn test_paragraph_length_boundary() {
        let exactly_twenty = "a".repeat(20);
        let twenty_one = "b".repeat(21);
        let record = extract(&format!("<p>{}</p><p>{}</p>", exactly_twenty, twenty_one));
        assert_eq!(record.paragraphs, vec![twenty_one]);
    }

    #[test]
    fn test_paragraphs_deduplicated() {
        let record = extract(&format!("<p>{}</p><p>{}</p><p>{}</p>", LONG_A, LONG_B, LONG_A));
        assert_eq!(record.paragraphs, vec![LONG_A, LONG_B]);
    }

    #[test]
    fn test_main_region_preferred() {
        let record = extract(&format!(
            "<nav><p>{}</p></nav><main><p>{}</p></main>",
            LONG_A, LONG_B
        ));
        assert_eq!(record.paragraphs, vec![LONG_B]);
    }

    #[test]
    fn test_content_class_region() {
        let record = extract(&format!(
            r#"<div class="sidebar"><p>{}</p></div><div class="content"><li>{}</li></div>"#,
            LONG_A, LONG_B
        ));
        assert_eq!(record.paragraphs, vec![LONG_B]);
    }

    #[test]
    fn test_main_region_without_long_paragraphs_yields_none() {
        let record = extract(&format!(
            "<main><p>short</p></main><footer><p>{}</p></footer>",
            LONG_A
        ));
        assert!(record.paragraphs.is_empty());
    }

    #[test]
    fn test_inline_markup_does_not_split_text() {
        let record = extract(
            "<h2>Uni<b>versity</b> Courses</h2>\
             <p>Read the notice <a href=\"/n\">here</a>, and apply before the deadline.</p>",
        );
        assert_eq!(record.headings, vec!["University Courses"]);
        assert_eq!(
            record.paragraphs,
            vec!["Read the notice here, and apply before the deadline."]
        );
    }

    #[test]
    fn test_nested_table_cells_not_repeated() {
        let record = extract(
            "<table><tr><td>Outer</td><td><table><tr><td>Inner</td></tr></table></td></tr></table>",
        );
        assert_eq!(record.table_rows, vec!["Outer | Inner", "Inner"]);
    }

    #[test]
    fn test_table_rows() {
        let record = extract(
            "<table><tr><th>Course</th><th>Seats</th></tr>\
             <tr><td> B.Tech </td><td>120</td></tr><tr></tr></table>",
        );
        assert_eq!(record.table_rows, vec!["Course | Seats", "B.Tech | 120"]);
    }

    #[test]
    fn test_media_links_with_context() {
        let record = extract(
            r#"<p>Download the <a href="/docs/Prospectus.PDF">prospectus</a> before applying.</p>
               <a href="https://www.youtube.com/watch?v=abc">Orientation video</a>
               <a href="/about">About</a>"#,
        );
        assert_eq!(
            record.media_links,
            vec![
                MediaLink {
                    url: "https://example.ac.in/docs/Prospectus.PDF".to_string(),
                    context: "Download the prospectus before applying.".to_string(),
                },
                MediaLink {
                    url: "https://www.youtube.com/watch?v=abc".to_string(),
                    context: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_media_resolved_against_base_url() {
        let url = Url::parse("https://example.ac.in/a/b").unwrap();
        let base = Url::parse("https://files.example.ac.in/pub/").unwrap();
        let document = Html::parse_document(r#"<a href="brochure.pdf">Brochure</a>"#);
        let record = extractor().extract(&document, &url, &base);
        assert_eq!(
            record.media_links[0].url,
            "https://files.example.ac.in/pub/brochure.pdf"
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = format!(
            "<title>T</title><h1>Head</h1><main><p>{}</p></main><table><tr><td>a</td></tr></table>",
            LONG_A
        );
        assert_eq!(extract(&html), extract(&html));
    }

    #[test]
    fn test_page_text_covers_headings_and_paragraphs() {
        let document = Html::parse_document("<h2>Education Policy</h2><p>Short one</p><div>hidden</div>");
        let text = page_text(&document);
        assert!(text.contains("Education Policy"));
        assert!(text.contains("Short one"));
        assert!(!text.contains("hidden"));
    }
}
