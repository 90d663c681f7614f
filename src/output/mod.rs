//! Output module for persisted crawl artifacts
//!
//! This module handles:
//! - One markdown document per source domain, appended page by page
//! - The visited-URL audit log
//! - Crawl statistics and the optional end-of-run markdown summary

mod aggregator;
mod markdown;
pub mod stats;
mod visited_log;

pub use aggregator::{domain_file_stem, DomainAggregator, DomainDocument};
pub use markdown::{
    format_domain_header, format_markdown_summary, format_page_section,
    generate_markdown_summary, SECTION_SEPARATOR,
};
pub use stats::{print_statistics, CrawlStatistics};
pub use visited_log::VisitedLog;
