//! Page fetching and the worker loop
//!
//! This module contains the worker side of a crawl:
//! - the [`Transport`] seam and its reqwest implementation
//! - the [`Worker`] that turns jobs into parsed results

mod fetcher;
mod worker;

pub use fetcher::{
    BodyStream, FetchError, FetchedPage, HttpTransport, Transport, DEFAULT_USER_AGENT,
};
pub use worker::Worker;
