//! State module for crawl records
//!
//! - `CrawlTarget`: one URL's record, carried between coordinator and workers
//! - `TargetError`: failure marker attached to a target that could not be parsed

mod target;

pub use target::{CrawlTarget, TargetError, TIMESTAMP_FORMAT};
