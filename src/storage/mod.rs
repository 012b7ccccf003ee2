//! Storage for crawl results
//!
//! This module contains:
//! - the [`Store`] trait the coordinator persists results through
//! - a SQLite backend with read APIs for crawl statistics
//! - a no-op backend for crawling without a database

mod mock;
mod schema;
mod sqlite;
mod traits;

pub use mock::MockStore;
pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::{SqliteStore, StoredPage};
pub use traits::{Store, StoreError, StoreResult};
