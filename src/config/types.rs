use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Link-Ripple
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub api: ApiConfig,
    pub pool: PoolConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Shared HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,

    /// TCP connect timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Upper bound on idle pooled connections
    pub max_idle_connections: usize,

    /// Upper bound on pooled connections kept per host
    pub max_connections_per_host: usize,

    /// How long an idle pooled connection is kept (seconds)
    pub idle_timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Base delay for exponential backoff (milliseconds)
    pub backoff_base_ms: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30 * 60,
            connect_timeout_secs: 10,
            max_idle_connections: 100,
            max_connections_per_host: 64,
            idle_timeout_secs: 90,
            user_agent: "LinkRipple/1.0".to_string(),
            backoff_base_ms: 1000,
        }
    }
}

/// External link API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    /// API endpoint, e.g. `https://en.wikipedia.org/w/api.php`
    pub endpoint: String,

    /// Namespace whose links are kept (0 is main content)
    pub namespace: i64,

    /// Value sent as `pllimit`
    pub page_limit: String,

    /// Attempts per API call, including the first
    pub max_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://en.wikipedia.org/w/api.php".to_string(),
            namespace: 0,
            page_limit: "max".to_string(),
            max_attempts: 3,
        }
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PoolConfig {
    /// Number of concurrent workers
    pub workers: usize,

    /// Capacity of the submission queue
    pub queue_capacity: usize,

    /// Capacity of each output queue (results and errors)
    pub output_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 32,
            queue_capacity: 64,
            output_capacity: 256,
        }
    }
}

/// Crawl run configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// File with one page name per line
    pub frontier_path: PathBuf,

    /// Capacity of the queue between the frontier reader and the submitter
    pub frontier_buffer: usize,

    /// Maximum duration of a whole run (seconds)
    pub deadline_secs: u64,
}

impl CrawlerConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            frontier_path: PathBuf::from("storages/seed_names.txt"),
            frontier_buffer: 1000,
            deadline_secs: 30 * 60,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// JSON-lines file receiving one record per crawled page.
    /// When absent, records are only logged.
    pub records_path: Option<PathBuf>,
}
