//! Link-Ripple: a concurrent link-graph harvester
//!
//! This crate reads a frontier of page names, asks a MediaWiki-style API for
//! each page's outbound links (following continuation cursors), and emits one
//! `PageRecord` per page for downstream persistence.

pub mod config;
pub mod crawler;
pub mod http;
pub mod output;
pub mod pool;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Link-Ripple operations
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] http::HttpError),

    #[error("Link fetcher error: {0}")]
    Fetch(#[from] crawler::FetchError),

    /// The run drained and stopped; `report` accounts for the tasks that
    /// were accepted before the read failed
    #[error("Failed to read frontier {}: {source}", path.display())]
    Frontier {
        path: PathBuf,
        source: std::io::Error,
        report: Box<output::CrawlReport>,
    },

    #[error("Worker pool error: {0}")]
    Pool(#[from] pool::PoolError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// Result type alias for Link-Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlError, CrawlPipeline, CrawlTask, FetchError, LinkFetcher, PageRecord};
pub use http::RetryingHttpClient;
pub use output::{CrawlReport, RunStatus};
pub use pool::{PoolState, Task, WorkerPool};
