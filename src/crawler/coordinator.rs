//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives the worker pool. Each worker loops over:
//! - Taking the next work item from the frontier
//! - Waiting for its politeness slot and fetching the page
//! - Handling blocked responses with the one-shot plain HTTP retry
//! - Classifying the page, extracting and aggregating its record
//! - Enqueueing the links it discovered
//!
//! A single URL's failure never ends the crawl. Only a poisoned frontier, a
//! failed domain document write or a crashed worker do.

use crate::config::Config;
use crate::crawler::extractor::{page_text, Extractor, PageRecord};
use crate::crawler::fetcher::{DocumentKind, HttpFetcher, PageFetcher};
use crate::crawler::frontier::{Frontier, WorkItem};
use crate::crawler::pacer::RequestPacer;
use crate::crawler::parser::{base_url, extract_links};
use crate::output::{generate_markdown_summary, CrawlStatistics, DomainAggregator, VisitedLog};
use crate::state::UrlState;
use crate::url::{normalize_url, parse_http_url, Classifier, PageClassification};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use scraper::Html;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// Pages between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// State shared by every worker for the lifetime of one run
struct CrawlContext {
    config: Config,
    frontier: Arc<Frontier>,
    aggregator: DomainAggregator,
    visited_log: VisitedLog,
    fetcher: Arc<dyn PageFetcher>,
    classifier: Classifier,
    extractor: Extractor,
    pacer: RequestPacer,
    pages_fetched: AtomicU64,
}

/// What a fetched text document yielded
struct PageAnalysis {
    classification: PageClassification,
    record: Option<PageRecord>,
    links: Vec<String>,
}

/// Cancels a running crawl from outside the worker pool
#[derive(Debug, Clone)]
pub struct StopHandle {
    frontier: Arc<Frontier>,
}

impl StopHandle {
    /// Stops handing out work; in-flight pages finish and documents close cleanly
    pub fn stop(&self) {
        self.frontier.stop();
    }
}

/// The crawl orchestrator
pub struct Crawler {
    context: Arc<CrawlContext>,
    config_hash: String,
    started_at: DateTime<Utc>,
}

impl Crawler {
    /// Creates a crawler that fetches over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    /// * `config_hash` - Hash of the configuration file, recorded in the visited log
    pub fn new(config: Config, config_hash: impl Into<String>) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent)?;
        Self::with_fetcher(config, config_hash, Arc::new(fetcher))
    }

    /// Creates a crawler around any fetch engine
    ///
    /// The output directory and the visited log are created (and truncated)
    /// here, so a crawler that fails to construct leaves no partial run behind.
    pub fn with_fetcher(
        config: Config,
        config_hash: impl Into<String>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, HarvestError> {
        let config_hash = config_hash.into();
        let started_at = Utc::now();

        let aggregator = DomainAggregator::new(&config.output.output_dir)?;
        let visited_log =
            VisitedLog::create(&config.output.visited_log_path, started_at, &config_hash)?;

        let context = CrawlContext {
            frontier: Arc::new(Frontier::new(config.crawler.max_depth)),
            aggregator,
            visited_log,
            fetcher,
            classifier: Classifier::from_config(&config.filters),
            extractor: Extractor::new(
                config.crawler.min_paragraph_length,
                config.filters.media_markers.as_slice(),
            ),
            pacer: RequestPacer::from_millis(config.crawler.politeness_delay),
            pages_fetched: AtomicU64::new(0),
            config,
        };

        Ok(Self {
            context: Arc::new(context),
            config_hash,
            started_at,
        })
    }

    /// Handle for stopping the crawl, e.g. on Ctrl-C
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            frontier: Arc::clone(&self.context.frontier),
        }
    }

    /// The run's frontier
    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.context.frontier
    }

    /// Seeds the frontier, runs the worker pool to quiescence (or stop) and
    /// closes every output document
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - The crawl finished or was stopped cleanly
    /// * `Err(HarvestError)` - A fatal error halted the crawl
    pub async fn run(self) -> Result<CrawlStatistics, HarvestError> {
        let context = &self.context;
        let worker_count = context.config.crawler.workers.max(1);

        tracing::info!(
            "Starting crawl with {} workers, max depth {}, {} seeds, {:?} between requests",
            worker_count,
            context.frontier.max_depth(),
            context.config.crawler.seeds.len(),
            context.pacer.delay()
        );
        tracing::info!(
            "Writing domain documents to {}",
            context.aggregator.output_dir().display()
        );

        for seed in &context.config.crawler.seeds {
            if context.classifier.is_blocked(seed) {
                tracing::warn!("Seed {} matches the blocklist and is ignored", seed);
                continue;
            }
            if !context.frontier.seed(seed)? {
                tracing::debug!("Duplicate seed {} ignored", seed);
            }
        }

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let context = Arc::clone(context);
            workers.spawn(async move { context.worker(worker_id).await });
        }

        let mut fatal: Option<HarvestError> = None;
        while let Some(joined) = workers.join_next().await {
            let outcome = joined.unwrap_or_else(|e| Err(HarvestError::Worker(e.to_string())));
            if let Err(e) = outcome {
                tracing::error!("Fatal crawl error: {}", e);
                context.frontier.stop();
                fatal.get_or_insert(e);
            }
        }

        let stopped_early = context.frontier.is_stopped();
        let finished = context.aggregator.finish();

        if let Some(e) = fatal {
            return Err(e);
        }
        let pages_by_domain = finished?;

        let stats = CrawlStatistics {
            started_at: self.started_at,
            finished_at: Utc::now(),
            config_hash: self.config_hash.clone(),
            urls_seen: context.frontier.visited_len()? as u64,
            urls_by_state: context.frontier.state_counts()?,
            pages_by_domain,
            stopped_early,
        };

        tracing::info!(
            "Crawl {}: {} URLs seen, {} pages extracted across {} domains in {}s",
            if stopped_early { "stopped" } else { "completed" },
            stats.urls_seen,
            stats.pages_extracted(),
            stats.pages_by_domain.len(),
            stats.duration_seconds()
        );

        if let Some(summary_path) = &context.config.output.summary_path {
            match generate_markdown_summary(&stats, Path::new(summary_path)) {
                Ok(()) => tracing::info!("Summary written to {}", summary_path),
                Err(e) => tracing::warn!("Failed to write summary to {}: {}", summary_path, e),
            }
        }

        Ok(stats)
    }
}

impl CrawlContext {
    async fn worker(&self, worker_id: u32) -> Result<(), HarvestError> {
        tracing::debug!("Worker {} started", worker_id);

        while let Some(lease) = self.frontier.next().await? {
            self.process(&lease.item).await?;

            let fetched = self.pages_fetched.fetch_add(1, Ordering::Relaxed) + 1;
            if fetched % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {} pages fetched, {} pending, {} domains written",
                    fetched,
                    self.frontier.pending_len()?,
                    self.aggregator.domains().len()
                );
            }
        }

        tracing::debug!("Worker {} finished", worker_id);
        Ok(())
    }

    /// Processes a single work item
    ///
    /// Per-URL problems are logged and recorded in the frontier; only fatal
    /// errors are returned.
    async fn process(&self, item: &WorkItem) -> Result<(), HarvestError> {
        self.pacer.wait_turn().await;

        tracing::debug!(
            "Fetching {} (depth {}, {})",
            item.url,
            item.depth,
            item.render_mode.as_str()
        );

        let response = match self.fetcher.fetch(&item.url, item.render_mode).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Fetch failed for {}: {}", item.url, e);
                self.frontier.mark(&item.url, UrlState::Failed)?;
                return Ok(());
            }
        };

        if response.is_blocked() {
            return self.handle_blocked(item);
        }

        if !response.is_success() {
            tracing::debug!("HTTP {} for {}", response.status, item.url);
            self.frontier.mark(&item.url, UrlState::Failed)?;
            return Ok(());
        }

        self.visited_log.record_now(&item.url);

        // A redirect target is claimed like any other URL, so a page reached
        // by two routes is only processed once
        let redirected_to = (normalize_url(&response.final_url) != item.normalized_url())
            .then_some(response.final_url.as_str());
        if let Some(target) = redirected_to {
            if !self.frontier.claim_final(target)? {
                tracing::debug!("{} redirected to already seen {}", item.url, target);
                self.frontier.mark(&item.url, UrlState::Skipped)?;
                return Ok(());
            }
        }

        if response.kind == DocumentKind::NonText {
            tracing::debug!("Skipping non-text response from {}", item.url);
            return self.settle(item, redirected_to, UrlState::NonText);
        }

        let parsed = parse_http_url(&response.final_url).or_else(|_| parse_http_url(&item.url));
        let page_url = match parsed {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Unusable URL {}: {}", response.final_url, e);
                return self.settle(item, redirected_to, UrlState::Failed);
            }
        };

        let body = response.body.as_deref().unwrap_or_default();
        let analysis = self.analyze(body, &page_url, item.depth);

        let outcome = match &analysis.record {
            Some(record) => {
                let page_number = self.aggregator.append(record)?;
                tracing::debug!(
                    "Extracted {} as page {} of {} ({:?})",
                    page_url,
                    page_number,
                    record.domain,
                    analysis.classification
                );
                UrlState::Extracted
            }
            None => {
                tracing::debug!("Skipping extraction for irrelevant page {}", page_url);
                UrlState::Skipped
            }
        };

        let mut enqueued = 0;
        for link in &analysis.links {
            if self.classifier.is_blocked(link) {
                tracing::trace!("Blocked link {} not enqueued", link);
                continue;
            }
            if self.frontier.try_enqueue_child(item, link)? {
                enqueued += 1;
            }
        }
        if enqueued > 0 {
            tracing::debug!("Enqueued {} new links from {}", enqueued, page_url);
        }

        self.settle(item, redirected_to, outcome)
    }

    /// Records the outcome for an item and the URL it was redirected to
    fn settle(
        &self,
        item: &WorkItem,
        redirected_to: Option<&str>,
        outcome: UrlState,
    ) -> Result<(), HarvestError> {
        self.frontier.mark(&item.url, outcome)?;
        if let Some(target) = redirected_to {
            self.frontier.mark(target, outcome)?;
        }
        Ok(())
    }

    /// Applies the one-shot render-mode fallback to a 403 response
    fn handle_blocked(&self, item: &WorkItem) -> Result<(), HarvestError> {
        if self.frontier.requeue_after_block(item)? {
            tracing::warn!("Blocked (403) on {}, retrying with plain HTTP", item.url);
        } else if item.retried_after_block {
            tracing::error!("Blocked (403) again on {}, dropping it", item.url);
        } else {
            tracing::debug!("Blocked (403) on {} while stopping, not retried", item.url);
        }
        Ok(())
    }

    /// Parses the document and derives everything the crawl needs from it
    ///
    /// Kept synchronous: the parsed document must never live across an await.
    fn analyze(&self, body: &str, page_url: &Url, depth: u32) -> PageAnalysis {
        let document = Html::parse_document(body);
        let base = base_url(&document, page_url);

        let classification = self
            .classifier
            .classify_page(page_url.as_str(), &page_text(&document));

        let record = classification
            .should_extract()
            .then(|| self.extractor.extract(&document, page_url, &base));

        // Links from the deepest level could never be enqueued
        let links = if depth < self.frontier.max_depth() {
            extract_links(&document, &base)
        } else {
            Vec::new()
        };

        PageAnalysis {
            classification,
            record,
            links,
        }
    }
}
