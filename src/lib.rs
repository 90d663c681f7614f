//! Knowledge Harvester: a focused crawler for education and government knowledge
//!
//! This crate walks the open web from a set of seed URLs, keeps to pages that look
//! like authoritative or topically relevant knowledge sources, extracts their
//! structured content, and aggregates it into one markdown document per domain.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Knowledge Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Frontier lock poisoned; visited set can no longer be trusted")]
    FrontierPoisoned,

    #[error("Failed to write domain document for {domain}: {source}")]
    DomainStorage {
        domain: String,
        source: std::io::Error,
    },

    #[error("Crawl worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if the error threatens the dedup or durability guarantees
    /// and must halt the crawl
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FrontierPoisoned | Self::DomainStorage { .. } | Self::Worker(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Knowledge Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, Frontier, PageRecord, RenderMode, WorkItem};
pub use output::{DomainAggregator, VisitedLog};
pub use state::UrlState;
pub use url::{extract_domain, normalize_url, Classifier};
