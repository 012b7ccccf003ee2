//! Crawl record for a single URL
//!
//! A target is created by the coordinator (as a seed or from a discovered
//! link), moved to exactly one worker for fetching and parsing, and moved back
//! to the coordinator as a result. It is never shared.

use crate::url::host_of;
use crate::UrlError;
use chrono::Utc;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Format of [`CrawlTarget::fetched_at`]
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Failure recorded on a target that was fetched but could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// No parser handles the response's content type
    #[error("no parser for content type: {0}")]
    UnsupportedContentType(String),
}

/// One URL's crawl record, from discovery through parsed result
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlTarget {
    pub url: String,
    pub host: String,
    pub scheme: String,
    pub text: Vec<String>,
    pub links: Vec<String>,
    pub fetched_at: Option<String>,
    pub depth: u32,
    /// URL of the page this one was discovered on; `None` for seeds
    pub found_via: Option<String>,
    pub content_type: String,
    pub error: Option<TargetError>,
}

impl CrawlTarget {
    /// Creates a seed target at depth 0
    pub fn seed(url: impl Into<String>) -> Self {
        Self::new(url.into(), 0, None)
    }

    /// Creates a target for a link discovered on `parent`
    pub fn discovered(url: impl Into<String>, depth: u32, parent: &str) -> Self {
        Self::new(url.into(), depth, Some(parent.to_string()))
    }

    fn new(url: String, depth: u32, found_via: Option<String>) -> Self {
        Self {
            url,
            host: String::new(),
            scheme: String::new(),
            text: Vec::new(),
            links: Vec::new(),
            fetched_at: None,
            depth,
            found_via,
            content_type: String::new(),
            error: None,
        }
    }

    /// Parses the target's URL and fills in `host` and `scheme`
    pub fn resolve_url(&mut self) -> Result<Url, UrlError> {
        let parsed = Url::parse(&self.url).map_err(|e| UrlError::Parse(e.to_string()))?;
        let host = host_of(&parsed).ok_or(UrlError::MissingDomain)?;

        self.host = host;
        self.scheme = parsed.scheme().to_string();
        Ok(parsed)
    }

    /// Stamps the time the response arrived
    pub fn mark_fetched(&mut self) {
        self.fetched_at = Some(Utc::now().format(TIMESTAMP_FORMAT).to_string());
    }

    /// Returns true if the target carries no failure marker
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (depth {})", self.url, self.depth)
    }
}
