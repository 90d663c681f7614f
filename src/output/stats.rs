//! Crawl statistics
//!
//! This module summarizes a finished (or stopped) crawl from the frontier's
//! per-URL states and the aggregator's per-domain page counts.

use crate::state::UrlState;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Hash of the configuration file the run used, empty if unknown
    pub config_hash: String,

    /// Number of distinct normalized URLs the frontier admitted
    pub urls_seen: u64,

    /// Count of URLs by lifecycle state
    pub urls_by_state: HashMap<UrlState, u64>,

    /// Pages appended to each domain document
    pub pages_by_domain: BTreeMap<String, usize>,

    /// True if the crawl was stopped before reaching quiescence
    pub stopped_early: bool,
}

impl CrawlStatistics {
    /// Number of URLs currently in `state`
    pub fn count(&self, state: UrlState) -> u64 {
        self.urls_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Total page records written across all domains
    pub fn pages_extracted(&self) -> usize {
        self.pages_by_domain.values().sum()
    }

    /// Share of seen URLs that produced a page record, in percent
    pub fn extraction_rate(&self) -> f64 {
        if self.urls_seen == 0 {
            0.0
        } else {
            (self.count(UrlState::Extracted) as f64 / self.urls_seen as f64) * 100.0
        }
    }

    /// Wall-clock duration of the run in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Non-zero state counts, largest first, ties broken by state order
    pub fn sorted_state_counts(&self) -> Vec<(UrlState, u64)> {
        let mut counts: Vec<_> = self
            .urls_by_state
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(state, count)| (*state, *count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  URLs seen: {}", stats.urls_seen);
    println!("  Pages extracted: {}", stats.pages_extracted());
    println!("  Domains written: {}", stats.pages_by_domain.len());
    println!("  Duration: {}s", stats.duration_seconds());
    if stats.stopped_early {
        println!("  Stopped before the frontier was exhausted");
    }
    println!();

    println!("URLs by State:");
    for (state, count) in stats.sorted_state_counts() {
        let percentage = if stats.urls_seen > 0 {
            (count as f64 / stats.urls_seen as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    if !stats.pages_by_domain.is_empty() {
        println!("Pages by Domain ({}):", stats.pages_by_domain.len());
        for (domain, count) in &stats.pages_by_domain {
            println!("  - {}: {}", domain, count);
        }
        println!();
    }

    println!(
        "Extraction Rate: {:.1}% ({} / {} URLs extracted)",
        stats.extraction_rate(),
        stats.count(UrlState::Extracted),
        stats.urls_seen
    );
}
