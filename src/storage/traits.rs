//! Storage trait and error types

use crate::state::CrawlTarget;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store is not connected")]
    NotConnected,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Destination for successfully parsed targets
///
/// The coordinator calls `connect` once before handing out any job, `insert`
/// once per successful result, and the process calls `close` after the crawl
/// has finished. The store is owned by the coordinator task, so
/// implementations need not be `Sync`.
pub trait Store: Send + 'static {
    /// Opens the underlying connection
    fn connect(&mut self) -> StoreResult<()>;

    /// Persists a target; inserting the same URL twice updates the record
    fn insert(&mut self, target: &CrawlTarget) -> StoreResult<()>;

    /// Releases the underlying connection
    fn close(&mut self) -> StoreResult<()>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn connect(&mut self) -> StoreResult<()> {
        (**self).connect()
    }

    fn insert(&mut self, target: &CrawlTarget) -> StoreResult<()> {
        (**self).insert(target)
    }

    fn close(&mut self) -> StoreResult<()> {
        (**self).close()
    }
}
