//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The fetch engine seam and its reqwest implementation
//! - The frontier (visited set, pending queue, quiescence)
//! - Global request pacing
//! - Link discovery and structured page extraction
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod pacer;
mod parser;

pub use coordinator::{Crawler, StopHandle};
pub use extractor::{page_text, Extractor, MediaLink, PageRecord};
pub use fetcher::{
    build_http_client, document_kind, DocumentKind, FetchError, FetchResponse, HttpFetcher,
    PageFetcher, RenderMode,
};
pub use frontier::{Frontier, Lease, WorkItem};
pub use pacer::RequestPacer;
pub use parser::{base_url, extract_links, resolve_link};

use crate::config::Config;
use crate::output::CrawlStatistics;
use crate::HarvestError;

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for a crawl without external cancellation.
/// It will:
/// 1. Create the output directory and visited log
/// 2. Seed the frontier
/// 3. Run the worker pool until the frontier is exhausted
/// 4. Close every domain document and return the run's statistics
///
/// # Example
///
/// ```no_run
/// use knowledge_harvester::config::load_config_with_hash;
/// use knowledge_harvester::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let stats = crawl(config, hash).await?;
/// println!("{} pages extracted", stats.pages_extracted());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    config: Config,
    config_hash: impl Into<String>,
) -> Result<CrawlStatistics, HarvestError> {
    Crawler::new(config, config_hash)?.run().await
}
