use crate::state::CrawlTarget;
use crate::storage::traits::{Store, StoreResult};

/// Store that discards everything it is given
///
/// Selected with `mock = true` (or `--mock-store`) to crawl without a
/// database.
#[derive(Debug, Default)]
pub struct MockStore {
    inserted: u64,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of inserts received so far
    pub fn inserted(&self) -> u64 {
        self.inserted
    }
}

impl Store for MockStore {
    fn connect(&mut self) -> StoreResult<()> {
        tracing::debug!("mock store connected");
        Ok(())
    }

    fn insert(&mut self, target: &CrawlTarget) -> StoreResult<()> {
        self.inserted += 1;
        tracing::debug!(url = %target.url, "mock store discarded target");
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        tracing::debug!(inserted = self.inserted, "mock store closed");
        Ok(())
    }
}
