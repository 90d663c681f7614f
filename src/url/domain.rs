use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use knowledge_harvester::url::extract_domain;
///
/// let url = Url::parse("https://NTA.ac.in/Downloads").unwrap();
/// assert_eq!(extract_domain(&url), Some("nta.ac.in".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a URL that the crawler may fetch (absolute HTTP or HTTPS with a host)
pub fn parse_http_url(raw_url: &str) -> UrlResult<Url> {
    let url = Url::parse(raw_url).map_err(|e| UrlError::Parse(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.ac.in/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.ac.in".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://www.education.gov.in/en/higher_education").unwrap();
        assert_eq!(
            extract_domain(&url),
            Some("www.education.gov.in".to_string())
        );
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("https://example.com/a").is_ok());
        assert!(parse_http_url("http://127.0.0.1:9000/").is_ok());
        assert!(matches!(
            parse_http_url("ftp://example.com/file"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(parse_http_url("/relative/path").is_err());
    }
}
