//! Crawl frontier: the visited set plus the queue of pending fetches
//!
//! This module handles:
//! - Atomic check-and-insert deduplication on normalized URLs
//! - The depth limit on discovered links
//! - The one-shot plain HTTP retry after a rendered fetch is blocked
//! - Quiescence detection (no pending items and no fetch in flight)
//! - External stop requests

use crate::crawler::fetcher::RenderMode;
use crate::state::UrlState;
use crate::url::normalize_url;
use crate::HarvestError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// One pending or completed fetch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// The URL as discovered, before normalization
    pub url: String,

    /// Link distance from the seed (seeds are depth 0)
    pub depth: u32,

    /// How the URL should be fetched
    pub render_mode: RenderMode,

    /// True only for the plain HTTP retry issued after a blocked rendered fetch
    pub retried_after_block: bool,
}

impl WorkItem {
    /// Creates a depth-0 rendered item
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
            render_mode: RenderMode::Rendered,
            retried_after_block: false,
        }
    }

    /// Creates a rendered item one level below `self`
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: self.depth + 1,
            render_mode: RenderMode::Rendered,
            retried_after_block: false,
        }
    }

    /// The plain HTTP retry for this item, if it is still eligible for one
    pub fn blocked_retry(&self) -> Option<Self> {
        if self.render_mode != RenderMode::Rendered || self.retried_after_block {
            return None;
        }
        Some(Self {
            url: self.url.clone(),
            depth: self.depth,
            render_mode: RenderMode::PlainHttp,
            retried_after_block: true,
        })
    }

    /// The dedup key for this item
    pub fn normalized_url(&self) -> String {
        normalize_url(&self.url)
    }
}

#[derive(Debug, Default)]
struct FrontierState {
    /// Every normalized URL ever enqueued, with its lifecycle state
    visited: HashMap<String, UrlState>,
    pending: VecDeque<WorkItem>,
    in_flight: usize,
    stopped: bool,
}

/// Shared frontier used by every crawl worker
///
/// All mutation happens under one mutex, which makes `try_enqueue` a single
/// atomic check-and-insert. Waiting workers park on a `Notify` that is woken on
/// every enqueue, every finished fetch and on stop.
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
    max_depth: u32,
}

/// A work item handed out by [`Frontier::next`]
///
/// The frontier counts the item as in flight until the lease is dropped.
#[derive(Debug)]
pub struct Lease {
    pub item: WorkItem,
    frontier: Arc<Frontier>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.frontier.finish_fetch();
    }
}

impl Frontier {
    /// Creates an empty frontier enforcing the given depth limit
    pub fn new(max_depth: u32) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            notify: Notify::new(),
            max_depth,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, FrontierState>, HarvestError> {
        self.state.lock().map_err(|_| HarvestError::FrontierPoisoned)
    }

    /// Maximum depth a work item may have
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Enqueues a depth-0 rendered item for a seed URL
    pub fn seed(&self, url: &str) -> Result<bool, HarvestError> {
        self.try_enqueue(WorkItem::seed(url))
    }

    /// Enqueues `item` unless its normalized URL was already seen
    ///
    /// Returns `Ok(true)` if the item was added. Items deeper than the depth
    /// limit and items arriving after `stop` are refused.
    pub fn try_enqueue(&self, item: WorkItem) -> Result<bool, HarvestError> {
        if item.depth > self.max_depth {
            return Ok(false);
        }

        let key = item.normalized_url();
        let mut state = self.lock()?;
        if state.stopped || state.visited.contains_key(&key) {
            return Ok(false);
        }

        state.visited.insert(key, UrlState::Enqueued);
        state.pending.push_back(item);
        drop(state);

        self.notify.notify_waiters();
        Ok(true)
    }

    /// Enqueues a link discovered on `parent`'s page, one level deeper
    pub fn try_enqueue_child(&self, parent: &WorkItem, url: &str) -> Result<bool, HarvestError> {
        if parent.depth + 1 > self.max_depth {
            return Ok(false);
        }
        self.try_enqueue(parent.child(url))
    }

    /// Claims the URL a fetch was redirected to
    ///
    /// Returns `Ok(false)` if its normalized form was already seen, in which
    /// case the page belongs to another work item. A claimed URL enters the
    /// visited set as `Fetched` and is never enqueued later.
    pub fn claim_final(&self, url: &str) -> Result<bool, HarvestError> {
        let key = normalize_url(url);
        let mut state = self.lock()?;
        if state.visited.contains_key(&key) {
            return Ok(false);
        }
        state.visited.insert(key, UrlState::Fetched);
        Ok(true)
    }

    /// Issues the plain HTTP retry for a blocked rendered fetch
    ///
    /// This is the only path by which a normalized URL is fetched twice.
    /// Returns `Ok(false)` if the item was already a retry; the URL is then
    /// marked `BlockedDropped`.
    pub fn requeue_after_block(&self, item: &WorkItem) -> Result<bool, HarvestError> {
        let key = item.normalized_url();
        let mut state = self.lock()?;

        let Some(retry) = item.blocked_retry() else {
            transition(&mut state, &key, UrlState::BlockedDropped);
            return Ok(false);
        };

        if !transition(&mut state, &key, UrlState::BlockedRetried) {
            return Ok(false);
        }

        if state.stopped {
            return Ok(false);
        }

        transition(&mut state, &key, UrlState::Enqueued);
        state.pending.push_back(retry);
        drop(state);

        self.notify.notify_waiters();
        Ok(true)
    }

    /// Records the outcome for a fetched URL
    ///
    /// Returns `Ok(false)` if the move breaks the URL lifecycle; the state is
    /// then left unchanged.
    pub fn mark(&self, url: &str, next: UrlState) -> Result<bool, HarvestError> {
        let key = normalize_url(url);
        let mut state = self.lock()?;
        Ok(transition(&mut state, &key, next))
    }

    /// Waits for the next work item
    ///
    /// Returns `None` once the crawl is quiescent (nothing pending and no fetch
    /// in flight) or after `stop`.
    pub async fn next(self: &Arc<Self>) -> Result<Option<Lease>, HarvestError> {
        loop {
            // Register for wakeups before inspecting state so no notification is lost
            let notified = self.notify.notified();
            {
                let mut state = self.lock()?;
                if state.stopped {
                    return Ok(None);
                }

                if let Some(item) = state.pending.pop_front() {
                    let key = item.normalized_url();
                    transition(&mut state, &key, UrlState::Fetched);
                    state.in_flight += 1;
                    return Ok(Some(Lease {
                        item,
                        frontier: Arc::clone(self),
                    }));
                }

                if state.in_flight == 0 {
                    drop(state);
                    // Let every other waiting worker observe quiescence too
                    self.notify.notify_waiters();
                    return Ok(None);
                }
            }
            notified.await;
        }
    }

    fn finish_fetch(&self) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.in_flight = state.in_flight.saturating_sub(1);
        drop(state);
        self.notify.notify_waiters();
    }

    /// Stops handing out work; pending items are abandoned, leased items finish
    pub fn stop(&self) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !state.stopped {
            tracing::info!(
                "Frontier stopped with {} pending and {} in flight",
                state.pending.len(),
                state.in_flight
            );
        }
        state.stopped = true;
        drop(state);
        self.notify.notify_waiters();
    }

    /// Returns true once `stop` has been called
    pub fn is_stopped(&self) -> bool {
        self.lock().map(|state| state.stopped).unwrap_or(true)
    }

    /// Returns true if the normalized form of `url` has been seen
    pub fn is_visited(&self, url: &str) -> Result<bool, HarvestError> {
        Ok(self.lock()?.visited.contains_key(&normalize_url(url)))
    }

    /// Current lifecycle state of a URL, if it was ever enqueued
    pub fn state_of(&self, url: &str) -> Result<Option<UrlState>, HarvestError> {
        Ok(self.lock()?.visited.get(&normalize_url(url)).copied())
    }

    /// Number of distinct normalized URLs seen
    pub fn visited_len(&self) -> Result<usize, HarvestError> {
        Ok(self.lock()?.visited.len())
    }

    /// Number of items waiting to be fetched
    pub fn pending_len(&self) -> Result<usize, HarvestError> {
        Ok(self.lock()?.pending.len())
    }

    /// Number of URLs in each lifecycle state
    pub fn state_counts(&self) -> Result<HashMap<UrlState, u64>, HarvestError> {
        let state = self.lock()?;
        let mut counts = HashMap::new();
        for url_state in state.visited.values() {
            *counts.entry(*url_state).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// Applies a lifecycle transition, logging and refusing invalid ones
fn transition(state: &mut FrontierState, key: &str, next: UrlState) -> bool {
    match state.visited.get_mut(key) {
        Some(current) if current.can_transition_to(next) => {
            *current = next;
            true
        }
        Some(current) => {
            tracing::warn!("Refusing state change {} -> {} for {}", current, next, key);
            false
        }
        None => {
            tracing::warn!("State change to {} for unknown URL {}", next, key);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_try_enqueue_dedups_on_normalized_url() {
        let frontier = Frontier::new(3);

        assert!(frontier.seed("https://example.ac.in/page").unwrap());
        assert!(!frontier.seed("https://example.ac.in/page#top").unwrap());
        assert!(!frontier.seed("https://example.ac.in/page").unwrap());

        assert_eq!(frontier.visited_len().unwrap(), 1);
        assert_eq!(frontier.pending_len().unwrap(), 1);
    }

    #[test]
    fn test_depth_policy() {
        let frontier = Frontier::new(1);
        let seed = WorkItem::seed("https://example.com/");
        let child = seed.child("https://example.com/a");

        assert!(frontier.try_enqueue_child(&seed, "https://example.com/a").unwrap());
        assert!(!frontier
            .try_enqueue_child(&child, "https://example.com/b")
            .unwrap());
        assert!(!frontier.is_visited("https://example.com/b").unwrap());
    }

    #[test]
    fn test_child_items_are_rendered_and_deeper() {
        let seed = WorkItem::seed("https://example.com/");
        let child = seed.child("https://example.com/x");
        assert_eq!(child.depth, 1);
        assert_eq!(child.render_mode, RenderMode::Rendered);
        assert!(!child.retried_after_block);
    }

    #[tokio::test]
    async fn test_next_returns_none_when_quiescent() {
        let frontier = Arc::new(Frontier::new(2));
        assert!(frontier.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_next_marks_fetched_and_tracks_in_flight() {
        let frontier = Arc::new(Frontier::new(2));
        frontier.seed("https://example.com/").unwrap();

        let lease = frontier.next().await.unwrap().unwrap();
        assert_eq!(lease.item.url, "https://example.com/");
        assert_eq!(
            frontier.state_of("https://example.com/").unwrap(),
            Some(UrlState::Fetched)
        );

        // A second worker waits while the first still holds a lease
        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next().await.unwrap().map(|l| l.item.url.clone()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        frontier
            .try_enqueue_child(&lease.item, "https://example.com/child")
            .unwrap();
        let got = waiter.await.unwrap();
        assert_eq!(got.as_deref(), Some("https://example.com/child"));

        drop(lease);
        assert!(frontier.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropping_last_lease_releases_waiters() {
        let frontier = Arc::new(Frontier::new(2));
        frontier.seed("https://example.com/").unwrap();
        let lease = frontier.next().await.unwrap().unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next().await.unwrap().is_none() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(lease);

        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_blocked_retry_is_one_shot() {
        let frontier = Arc::new(Frontier::new(2));
        frontier.seed("https://example.gov.in/").unwrap();

        let first = frontier.next().await.unwrap().unwrap();
        assert!(frontier.requeue_after_block(&first.item).unwrap());
        drop(first);

        let retry = frontier.next().await.unwrap().unwrap();
        assert_eq!(retry.item.render_mode, RenderMode::PlainHttp);
        assert!(retry.item.retried_after_block);
        assert_eq!(retry.item.depth, 0);

        assert!(!frontier.requeue_after_block(&retry.item).unwrap());
        assert_eq!(
            frontier.state_of("https://example.gov.in/").unwrap(),
            Some(UrlState::BlockedDropped)
        );
        drop(retry);

        assert!(frontier.next().await.unwrap().is_none());
    }

    #[test]
    fn test_mark_rejects_invalid_transition() {
        let frontier = Frontier::new(1);
        frontier.seed("https://example.com/").unwrap();

        assert!(!frontier
            .mark("https://example.com/", UrlState::Extracted)
            .unwrap());
        assert_eq!(
            frontier.state_of("https://example.com/").unwrap(),
            Some(UrlState::Enqueued)
        );
        assert!(!frontier.mark("https://unknown.com/", UrlState::Failed).unwrap());
    }

    #[tokio::test]
    async fn test_stop_abandons_pending() {
        let frontier = Arc::new(Frontier::new(1));
        frontier.seed("https://example.com/a").unwrap();
        frontier.stop();

        assert!(frontier.is_stopped());
        assert!(frontier.next().await.unwrap().is_none());
        assert!(!frontier.seed("https://example.com/b").unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_enqueue_admits_each_url_once() {
        let frontier = Arc::new(Frontier::new(5));
        let mut handles = Vec::new();

        for worker in 0..8 {
            let frontier = Arc::clone(&frontier);
            handles.push(tokio::spawn(async move {
                let mut admitted = 0;
                for i in 0..50 {
                    let url = if worker % 2 == 0 {
                        format!("https://example.com/page/{}", i)
                    } else {
                        format!("https://example.com/page/{}#w{}", i, worker)
                    };
                    if frontier.try_enqueue(WorkItem::seed(url)).unwrap() {
                        admitted += 1;
                    }
                }
                admitted
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }
        assert_eq!(total, 50);
        assert_eq!(frontier.visited_len().unwrap(), 50);
    }

    #[test]
    fn test_claim_final_blocks_later_enqueue() {
        let frontier = Frontier::new(2);
        frontier.seed("https://example.com/a").unwrap();

        assert!(!frontier.claim_final("https://example.com/a#x").unwrap());
        assert!(frontier.claim_final("https://example.com/a/").unwrap());
        assert!(!frontier.claim_final("https://example.com/a/").unwrap());
        assert!(!frontier.seed("https://example.com/a/").unwrap());
        assert_eq!(
            frontier.state_of("https://example.com/a/").unwrap(),
            Some(UrlState::Fetched)
        );
    }

    #[test]
    fn test_state_counts() {
        let frontier = Frontier::new(1);
        frontier.seed("https://a.com/").unwrap();
        frontier.seed("https://b.com/").unwrap();

        let counts = frontier.state_counts().unwrap();
        assert_eq!(counts.get(&UrlState::Enqueued), Some(&2));
    }
}
