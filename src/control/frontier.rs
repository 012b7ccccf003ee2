//! Pending work and visited bookkeeping
//!
//! Small frontiers are drained in insertion order. Once the queue grows past
//! the random index threshold the next target is drawn uniformly from the
//! first `threshold` entries, which spreads consecutive requests across
//! hosts without a per-host scheduler.

use crate::state::CrawlTarget;
use std::collections::{HashSet, VecDeque};

/// The coordinator's queue of targets awaiting a worker
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTarget>,
    pending: HashSet<String>,
    visited: HashSet<String>,
    random_index_threshold: usize,
    rng: fastrand::Rng,
}

impl Frontier {
    pub fn new(random_index_threshold: usize) -> Self {
        Self::with_rng(random_index_threshold, fastrand::Rng::new())
    }

    /// Creates a frontier with a seeded generator for reproducible draws
    pub fn with_rng(random_index_threshold: usize, rng: fastrand::Rng) -> Self {
        Self {
            queue: VecDeque::new(),
            pending: HashSet::new(),
            visited: HashSet::new(),
            random_index_threshold: random_index_threshold.max(1),
            rng,
        }
    }

    /// Queues a target unless its URL is already pending or visited
    ///
    /// Returns true if the target was queued.
    pub fn push(&mut self, target: CrawlTarget) -> bool {
        if self.visited.contains(&target.url) || self.pending.contains(&target.url) {
            return false;
        }
        self.pending.insert(target.url.clone());
        self.queue.push_back(target);
        true
    }

    /// Takes the next unvisited target, or `None` if nothing is left
    ///
    /// Entries that were visited while they sat in the queue are discarded.
    pub fn next(&mut self) -> Option<CrawlTarget> {
        while !self.queue.is_empty() {
            let index = if self.queue.len() > self.random_index_threshold {
                self.rng.usize(..self.random_index_threshold)
            } else {
                0
            };

            let target = self.queue.remove(index)?;
            self.pending.remove(&target.url);

            if self.visited.contains(&target.url) {
                tracing::trace!(url = %target.url, "discarding already visited target");
                continue;
            }
            return Some(target);
        }
        None
    }

    /// Records that a result for `url` came back
    pub fn mark_visited(&mut self, url: &str) {
        self.visited.insert(url.to_string());
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Number of queued targets
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of URLs with a recorded result
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }
}
