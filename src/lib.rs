//! Driftnet: a recursive web crawler
//!
//! A single coordinator owns the crawl frontier and hands jobs to a pool of
//! fetch/parse workers over a message protocol. Workers pull pages through a
//! [`crawler::Transport`], extract text and links with a content-type driven
//! parser, and submit the result back; the coordinator persists it through a
//! [`storage::Store`] and feeds newly discovered links into the frontier.

pub mod config;
pub mod control;
pub mod crawler;
pub mod parser;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Driftnet operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Store error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Coordinator task failed: {0}")]
    Join(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingDomain,
}

/// Result type alias for Driftnet operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, CrawlConfig};
pub use control::{Coordinator, CoordinatorHandle, CrawlSummary, Job};
pub use crawler::{HttpTransport, Transport, Worker};
pub use state::{CrawlTarget, TargetError};
pub use storage::{MockStore, SqliteStore, Store};
