use serde::Deserialize;

/// Default number of leading frontier entries the coordinator picks from at random
pub const DEFAULT_RANDOM_INDEX_THRESHOLD: usize = 300;

/// Default number of successes between two status log lines
pub const DEFAULT_STATUS_LOG_FREQUENCY: u64 = 30;

/// Default pause a worker takes after receiving a `Wait` job (milliseconds)
pub const DEFAULT_IDLE_INTERVAL_MS: u64 = 1000;

/// Default HTTP request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default SQLite database location
pub const DEFAULT_DATABASE_PATH: &str = "./driftnet.db";

/// Main configuration structure for Driftnet
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URLs the crawl starts from (depth 0)
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Number of concurrent fetch/parse workers
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Maximum link depth from the seeds; unlimited when absent
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,

    /// Hosts discovered links must belong to; every host is allowed when absent
    #[serde(rename = "whitelisted-hosts")]
    pub whitelisted_hosts: Option<Vec<String>>,

    /// Frontier size above which the next job is drawn at random
    #[serde(
        rename = "random-index-threshold",
        default = "default_random_index_threshold"
    )]
    pub random_index_threshold: usize,

    /// Successes between two status log lines
    #[serde(
        rename = "status-log-frequency",
        default = "default_status_log_frequency"
    )]
    pub status_log_frequency: u64,

    /// Pause after an empty-frontier `Wait` job (milliseconds)
    #[serde(rename = "idle-interval-ms", default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional proxy every request is routed through
    pub proxy: Option<String>,

    /// User agent override
    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,
}

/// Store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Discard results instead of persisting them
    #[serde(default)]
    pub mock: bool,
}

/// Crawl policy handed to the coordinator; fixed for the lifetime of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub max_depth: Option<u32>,
    pub whitelisted_hosts: Option<Vec<String>>,
    pub random_index_threshold: usize,
    pub status_log_frequency: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            whitelisted_hosts: None,
            random_index_threshold: DEFAULT_RANDOM_INDEX_THRESHOLD,
            status_log_frequency: DEFAULT_STATUS_LOG_FREQUENCY,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            proxy: None,
            user_agent: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            mock: false,
        }
    }
}

impl Config {
    /// Derives the coordinator policy from the crawler section
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            max_depth: self.crawler.max_depth,
            whitelisted_hosts: self.crawler.whitelisted_hosts.clone(),
            random_index_threshold: self.crawler.random_index_threshold,
            status_log_frequency: self.crawler.status_log_frequency,
        }
    }
}

fn default_workers() -> u32 {
    1
}

fn default_random_index_threshold() -> usize {
    DEFAULT_RANDOM_INDEX_THRESHOLD
}

fn default_status_log_frequency() -> u64 {
    DEFAULT_STATUS_LOG_FREQUENCY
}

fn default_idle_interval_ms() -> u64 {
    DEFAULT_IDLE_INTERVAL_MS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_database_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}
