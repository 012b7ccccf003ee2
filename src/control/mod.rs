//! Crawl coordination
//!
//! - [`Coordinator`]: the task owning the frontier and the store
//! - [`Frontier`]: pending targets and visited URLs
//! - [`Job`] and [`WorkerConnection`]: the worker-facing protocol

mod coordinator;
mod frontier;
mod job;

pub use coordinator::{Coordinator, CoordinatorHandle, CrawlSummary, StopSignal};
pub use frontier::Frontier;
pub use job::{Job, WorkerConnection};
