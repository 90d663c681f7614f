//! URL handling module for Knowledge Harvester
//!
//! This module provides URL normalization, domain extraction, and the
//! blocklist / trust / relevance classification applied to URLs and pages.

mod domain;
mod normalize;

use crate::config::FilterConfig;

// Re-export main functions
pub use domain::{extract_domain, parse_http_url};
pub use normalize::normalize_url;

/// Why a fetched page was or was not kept for extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageClassification {
    /// URL matches a trust hint; relevance is not consulted
    Trusted,
    /// Untrusted, but the page text mentions a knowledge keyword
    Relevant,
    /// Neither trusted nor relevant - links are followed, content is dropped
    Irrelevant,
}

impl PageClassification {
    /// Returns true if the page should be turned into a record
    pub fn should_extract(&self) -> bool {
        matches!(self, Self::Trusted | Self::Relevant)
    }
}

/// Substring-based URL and page classifier
///
/// All lists are lowercased once at construction; every check lowercases its
/// input and looks for any list entry as a substring.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    blocked: Vec<String>,
    trust_hints: Vec<String>,
    relevance_keywords: Vec<String>,
}

impl Classifier {
    /// Creates a classifier from explicit lists
    pub fn new<S: AsRef<str>>(blocked: &[S], trust_hints: &[S], relevance_keywords: &[S]) -> Self {
        Self {
            blocked: lowercase_all(blocked),
            trust_hints: lowercase_all(trust_hints),
            relevance_keywords: lowercase_all(relevance_keywords),
        }
    }

    /// Creates a classifier from the `[filters]` configuration section
    pub fn from_config(filters: &FilterConfig) -> Self {
        Self::new(
            filters.blocked.as_slice(),
            filters.trust_hints.as_slice(),
            filters.relevance_keywords.as_slice(),
        )
    }

    /// True if the URL must never be enqueued
    pub fn is_blocked(&self, url: &str) -> bool {
        contains_any(&url.to_lowercase(), &self.blocked)
    }

    /// True if the URL points at an authoritative source
    pub fn is_trusted_domain(&self, url: &str) -> bool {
        contains_any(&url.to_lowercase(), &self.trust_hints)
    }

    /// True if the page text mentions any knowledge keyword
    pub fn is_relevant(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.relevance_keywords)
    }

    /// Applies the keep policy: trusted OR relevant
    ///
    /// # Examples
    ///
    /// ```
    /// use knowledge_harvester::url::{Classifier, PageClassification};
    ///
    /// let classifier = Classifier::new(&["facebook"], &[".gov.in"], &["policy"]);
    /// assert_eq!(
    ///     classifier.classify_page("https://ugc.gov.in/", ""),
    ///     PageClassification::Trusted
    /// );
    /// assert_eq!(
    ///     classifier.classify_page("https://example.com/", "Education Policy"),
    ///     PageClassification::Relevant
    /// );
    /// ```
    pub fn classify_page(&self, url: &str, page_text: &str) -> PageClassification {
        if self.is_trusted_domain(url) {
            PageClassification::Trusted
        } else if self.is_relevant(page_text) {
            PageClassification::Relevant
        } else {
            PageClassification::Irrelevant
        }
    }
}

fn lowercase_all<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.as_ref().to_lowercase())
        .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_classifier() -> Classifier {
        Classifier::new(
            &["facebook", "twitter", "news", "wordpress"],
            &[".gov.in", ".ac.in", ".nic.in", ".edu"],
            &["education", "policy", "scheme", "university"],
        )
    }

    #[test]
    fn test_is_blocked() {
        let classifier = create_test_classifier();
        assert!(classifier.is_blocked("https://www.facebook.com/ministry"));
        assert!(classifier.is_blocked("https://TWITTER.com/x"));
        assert!(classifier.is_blocked("https://timesnews.example.com/"));
        assert!(!classifier.is_blocked("https://www.education.gov.in/"));
    }

    #[test]
    fn test_is_trusted_domain() {
        let classifier = create_test_classifier();
        assert!(classifier.is_trusted_domain("https://www.education.gov.in/en"));
        assert!(classifier.is_trusted_domain("https://IITB.AC.IN/"));
        assert!(classifier.is_trusted_domain("https://mit.edu/courses"));
        assert!(!classifier.is_trusted_domain("https://example.com/"));
    }

    #[test]
    fn test_is_relevant_case_insensitive() {
        let classifier = create_test_classifier();
        assert!(classifier.is_relevant("Education Policy"));
        assert!(classifier.is_relevant("the national SCHEME for students"));
        assert!(!classifier.is_relevant("buy shoes online"));
        assert!(!classifier.is_relevant(""));
    }

    #[test]
    fn test_configured_keywords_are_lowercased() {
        let classifier = Classifier::new(&["FaceBook"], &[".GOV.IN"], &["Policy"]);
        assert!(classifier.is_blocked("https://facebook.com/"));
        assert!(classifier.is_trusted_domain("https://x.gov.in/"));
        assert!(classifier.is_relevant("new policy announced"));
    }

    #[test]
    fn test_trust_overrides_relevance() {
        let classifier = create_test_classifier();
        assert_eq!(
            classifier.classify_page("https://nta.ac.in/", "nothing interesting"),
            PageClassification::Trusted
        );
        assert_eq!(
            classifier.classify_page("https://example.com/", "university admissions"),
            PageClassification::Relevant
        );
        assert_eq!(
            classifier.classify_page("https://example.com/", "shopping cart"),
            PageClassification::Irrelevant
        );
    }

    #[test]
    fn test_should_extract() {
        assert!(PageClassification::Trusted.should_extract());
        assert!(PageClassification::Relevant.should_extract());
        assert!(!PageClassification::Irrelevant.should_extract());
    }

    #[test]
    fn test_empty_lists_match_nothing() {
        let classifier = Classifier::default();
        assert!(!classifier.is_blocked("https://facebook.com/"));
        assert!(!classifier.is_trusted_domain("https://x.gov.in/"));
        assert!(!classifier.is_relevant("education"));
    }
}
