//! Markdown rendering
//!
//! This module renders the pieces of every persisted document:
//! - The one-time header of a domain document
//! - One numbered page section per extracted page
//! - The optional end-of-run summary

use crate::crawler::PageRecord;
use crate::output::stats::CrawlStatistics;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Separator written after every page section
pub const SECTION_SEPARATOR: &str = "---";

/// Formats the header written once at the top of a domain document
pub fn format_domain_header(domain: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "# Knowledge pages: {}\n\n_Generated: {}_\n\n{}\n\n",
        domain,
        generated_at.to_rfc3339(),
        SECTION_SEPARATOR
    )
}

/// Formats one page section
///
/// # Arguments
///
/// * `page_number` - 1-based position of the page within its domain document
/// * `record` - The extracted page
///
/// # Returns
///
/// The complete section including its trailing separator, ready to be written
/// in a single call
pub fn format_page_section(page_number: usize, record: &PageRecord) -> String {
    let mut md = String::new();

    md.push_str(&format!(
        "## Page {}: {}\n\n",
        page_number,
        record.title.as_deref().unwrap_or("Untitled")
    ));
    md.push_str(&format!("**Source:** {}\n\n", record.url));

    if let Some(summary) = &record.meta_description {
        md.push_str(&format!("**Summary:** {}\n\n", summary));
    }

    md.push_str("### Headings\n\n");
    for heading in &record.headings {
        md.push_str(&format!("- {}\n", heading));
    }
    md.push('\n');

    md.push_str("### Content\n\n");
    for paragraph in &record.paragraphs {
        md.push_str(paragraph);
        md.push_str("\n\n");
    }

    if !record.table_rows.is_empty() {
        md.push_str("### Tables\n\n");
        for row in &record.table_rows {
            md.push_str(row);
            md.push('\n');
        }
        md.push('\n');
    }

    if !record.media_links.is_empty() {
        md.push_str("### Media & Downloads\n\n");
        for media in &record.media_links {
            md.push_str(&format!("- Context: {}\n", media.context));
            md.push_str(&format!("  Link: {}\n\n", media.url));
        }
    }

    md.push_str(SECTION_SEPARATOR);
    md.push_str("\n\n");
    md
}

/// Writes the run summary as markdown to `output_path`
pub fn generate_markdown_summary(
    stats: &CrawlStatistics,
    output_path: &Path,
) -> std::io::Result<()> {
    let markdown = format_markdown_summary(stats);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;
    file.flush()?;

    Ok(())
}

/// Formats the run summary as markdown
pub fn format_markdown_summary(stats: &CrawlStatistics) -> String {
    let mut md = String::new();

    md.push_str("# Knowledge Harvester Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", stats.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        stats.duration_seconds()
    ));
    if !stats.config_hash.is_empty() {
        md.push_str(&format!("- **Config Hash**: {}\n", stats.config_hash));
    }
    md.push_str(&format!(
        "- **Stopped early**: {}\n\n",
        if stats.stopped_early { "yes" } else { "no" }
    ));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **URLs Seen**: {}\n", stats.urls_seen));
    md.push_str(&format!("- **Pages Extracted**: {}\n", stats.pages_extracted()));
    md.push_str(&format!("- **Domains Written**: {}\n", stats.pages_by_domain.len()));
    md.push_str(&format!(
        "- **Extraction Rate**: {:.2}%\n\n",
        stats.extraction_rate()
    ));

    md.push_str("## URL State Breakdown\n\n");
    md.push_str("| State | Count |\n");
    md.push_str("|-------|-------|\n");
    for (state, count) in stats.sorted_state_counts() {
        md.push_str(&format!("| {} | {} |\n", state, count));
    }
    md.push('\n');

    if !stats.pages_by_domain.is_empty() {
        md.push_str("## Pages by Domain\n\n");
        md.push_str("| Domain | Pages |\n");
        md.push_str("|--------|-------|\n");
        for (domain, count) in &stats.pages_by_domain {
            md.push_str(&format!("| {} | {} |\n", domain, count));
        }
        md.push('\n');
    }

    md
}
