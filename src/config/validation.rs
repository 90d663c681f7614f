use crate::config::types::{Config, CrawlerConfig, FilterConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_filters(&config.filters)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        validate_seed(seed)?;
    }

    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.fetch_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout must be >= 1s, got {}s",
            config.fetch_timeout
        )));
    }

    Ok(())
}

/// Seeds must be absolute HTTP(S) URLs
fn validate_seed(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    if let Some(browser) = &config.browser_user_agent {
        if browser.trim().is_empty() {
            return Err(ConfigError::Validation(
                "browser_user_agent cannot be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.visited_log_path.is_empty() {
        return Err(ConfigError::Validation(
            "visited_log_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.summary_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the classification lists
fn validate_filters(filters: &FilterConfig) -> Result<(), ConfigError> {
    for (name, list) in [
        ("blocked", &filters.blocked),
        ("trust-hints", &filters.trust_hints),
        ("relevance-keywords", &filters.relevance_keywords),
        ("media-markers", &filters.media_markers),
    ] {
        if list.iter().any(|entry| entry.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "filters.{} contains an empty entry",
                name
            )));
        }
    }

    // Neither list set means no page could ever be kept
    if filters.trust_hints.is_empty() && filters.relevance_keywords.is_empty() {
        return Err(ConfigError::Validation(
            "at least one of filters.trust-hints or filters.relevance-keywords must be set"
                .to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(trust: &[&str], keywords: &[&str]) -> FilterConfig {
        FilterConfig {
            blocked: vec!["facebook".to_string()],
            trust_hints: trust.iter().map(|s| s.to_string()).collect(),
            relevance_keywords: keywords.iter().map(|s| s.to_string()).collect(),
            ..FilterConfig::default()
        }
    }

    #[test]
    fn test_validate_seed() {
        assert!(validate_seed("https://www.education.gov.in/en/higher_education").is_ok());
        assert!(validate_seed("http://127.0.0.1:8080/").is_ok());

        assert!(validate_seed("").is_err());
        assert!(validate_seed("ftp://example.com/").is_err());
        assert!(validate_seed("not a url").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_filters_need_trust_or_relevance() {
        assert!(validate_filters(&filters(&[".gov.in"], &[])).is_ok());
        assert!(validate_filters(&filters(&[], &["education"])).is_ok());
        assert!(matches!(
            validate_filters(&filters(&[], &[])),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_filters_reject_blank_entries() {
        assert!(validate_filters(&filters(&[".gov.in", "  "], &[])).is_err());
    }
}
