use serde::Deserialize;

/// Markers that identify a downloadable media link when no list is configured
pub const DEFAULT_MEDIA_MARKERS: &[&str] = &[
    ".pdf",
    ".jpg",
    ".png",
    ".jpeg",
    ".mp4",
    ".webm",
    "youtube.com",
    "youtu.be",
];

/// Main configuration structure for Knowledge Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub filters: FilterConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URLs the crawl starts from (depth 0)
    pub seeds: Vec<String>,

    /// Maximum depth to crawl from seed URLs
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of parallel crawl workers
    pub workers: u32,

    /// Minimum time between two outbound requests, across all workers (milliseconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// Paragraphs must be strictly longer than this many characters to be kept
    #[serde(
        rename = "min-paragraph-length",
        default = "default_min_paragraph_length"
    )]
    pub min_paragraph_length: usize,

    /// Per-fetch timeout handed to the fetch engine (seconds)
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Browser user agent presented on rendered fetches
    #[serde(rename = "browser-user-agent", default)]
    pub browser_user_agent: Option<String>,
}

impl UserAgentConfig {
    /// Identifying user agent: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn crawler_user_agent(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one markdown document per domain
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Path to the append-only visited URL audit log
    #[serde(rename = "visited-log-path")]
    pub visited_log_path: String,

    /// Optional path for the end-of-run markdown summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Substring lists driving URL and page classification
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// URLs containing any of these are never enqueued
    #[serde(default)]
    pub blocked: Vec<String>,

    /// URLs containing any of these are trusted and skip relevance filtering
    #[serde(rename = "trust-hints", default)]
    pub trust_hints: Vec<String>,

    /// Page text containing any of these marks the page as relevant
    #[serde(rename = "relevance-keywords", default)]
    pub relevance_keywords: Vec<String>,

    /// Anchor hrefs containing any of these are captured as media links
    #[serde(rename = "media-markers", default = "default_media_markers")]
    pub media_markers: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blocked: Vec::new(),
            trust_hints: Vec::new(),
            relevance_keywords: Vec::new(),
            media_markers: default_media_markers(),
        }
    }
}

fn default_politeness_delay() -> u64 {
    1000
}

fn default_min_paragraph_length() -> usize {
    20
}

fn default_fetch_timeout() -> u64 {
    180
}

fn default_media_markers() -> Vec<String> {
    DEFAULT_MEDIA_MARKERS.iter().map(|m| m.to_string()).collect()
}
