//! Configuration module for Driftnet
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and layering command-line overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use driftnet::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("driftnet.toml")).unwrap();
//! println!("Crawler will start from {} seeds", config.crawler.seeds.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, CrawlerConfig, HttpConfig, StoreConfig, DEFAULT_IDLE_INTERVAL_MS,
    DEFAULT_RANDOM_INDEX_THRESHOLD, DEFAULT_STATUS_LOG_FREQUENCY, DEFAULT_TIMEOUT_SECS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, parse_config};
pub use validation::validate;

/// Values supplied on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub seeds: Vec<String>,
    pub workers: Option<u32>,
    pub max_depth: Option<u32>,
    pub whitelisted_hosts: Vec<String>,
    pub proxy: Option<String>,
    pub timeout_secs: Option<u64>,
    pub mock_store: bool,
}

impl Config {
    /// Applies command-line overrides; list values replace the file's lists
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if !overrides.seeds.is_empty() {
            self.crawler.seeds = overrides.seeds;
        }
        if let Some(workers) = overrides.workers {
            self.crawler.workers = workers;
        }
        if let Some(depth) = overrides.max_depth {
            self.crawler.max_depth = Some(depth);
        }
        if !overrides.whitelisted_hosts.is_empty() {
            self.crawler.whitelisted_hosts = Some(overrides.whitelisted_hosts);
        }
        if overrides.proxy.is_some() {
            self.http.proxy = overrides.proxy;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.http.timeout_secs = timeout;
        }
        if overrides.mock_store {
            self.store.mock = true;
        }
    }
}
