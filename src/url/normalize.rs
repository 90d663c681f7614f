/// Canonicalizes a URL for dedup comparisons
///
/// Only the fragment is removed; scheme, host, path and query are kept verbatim.
/// Normalization is best-effort, so input that is not a well-formed URL passes
/// through with nothing but its fragment stripped.
///
/// # Examples
///
/// ```
/// use knowledge_harvester::url::normalize_url;
///
/// assert_eq!(
///     normalize_url("https://example.ac.in/courses?id=4#fees"),
///     "https://example.ac.in/courses?id=4"
/// );
/// ```
pub fn normalize_url(raw_url: &str) -> String {
    match raw_url.split_once('#') {
        Some((before, _fragment)) => before.to_string(),
        None => raw_url.to_string(),
    }
}
