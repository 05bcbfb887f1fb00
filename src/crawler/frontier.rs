//! Deduplicating work queue shared by all workers

use crate::crawler::request::CrawlRequest;
use crate::url::frontier_key;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use url::Url;

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<CrawlRequest>,
    seen: HashSet<String>,
}

/// FIFO of pending requests keyed by normalized URL
///
/// A URL is admitted at most once for the lifetime of the frontier, whatever
/// its label, so no URL can be dispatched to two workers.
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues the request unless its URL was seen before
    ///
    /// # Returns
    ///
    /// `true` if the request was queued, `false` for a duplicate
    pub fn push(&self, request: CrawlRequest) -> bool {
        let key = frontier_key(request.url());
        let mut inner = self.lock();

        if !inner.seen.insert(key) {
            tracing::trace!("Skipping already-seen URL {}", request.url());
            return false;
        }

        inner.queue.push_back(request);
        true
    }

    /// Records a URL handled outside the queue so it is never queued later
    ///
    /// # Returns
    ///
    /// `true` if the URL had not been seen before
    pub fn mark_seen(&self, url: &Url) -> bool {
        self.lock().seen.insert(frontier_key(url))
    }

    /// Takes the oldest pending request
    pub fn pop(&self) -> Option<CrawlRequest> {
        self.lock().queue.pop_front()
    }

    /// Number of requests waiting to be dispatched
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Number of distinct URLs ever admitted
    pub fn seen_count(&self) -> usize {
        self.lock().seen.len()
    }

    /// Drops everything still pending and returns how many were dropped
    pub fn drain(&self) -> usize {
        let mut inner = self.lock();
        let dropped = inner.queue.len();
        inner.queue.clear();
        dropped
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FrontierInner> {
        // The guarded data stays consistent even if a holder panicked mid-push
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
