//! Crawler module for link discovery
//!
//! This module contains the core crawling logic, including:
//! - The link API response model
//! - Paginated link fetching per page
//! - Crawl tasks scheduled on the worker pool
//! - Frontier reading and overall run orchestration

mod api;
mod fetcher;
mod frontier;
mod pipeline;
mod task;

pub use api::{ApiContinue, ApiLink, ApiPage, ApiQuery, ApiResponse};
pub use fetcher::LinkFetcher;
pub use frontier::{count_frontier_entries, frontier_entry, read_frontier};
pub use pipeline::{run_crawl, CrawlPipeline};
pub use task::CrawlTask;

use crate::http::HttpError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Links discovered for one page
///
/// Serialized as `{"name": ..., "neighbors": [...]}`, the shape accepted by
/// the persistence layer's create operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Page name as read from the frontier
    pub name: String,

    /// Outbound main-namespace links, in discovery order, not deduplicated
    pub neighbors: Vec<String>,
}

/// Errors that can occur while fetching a page's links
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid API endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[error("Failed to build request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Http(#[source] HttpError),

    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("Failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Crawl cancelled")]
    Cancelled,
}

impl FetchError {
    /// Returns true when the fetch stopped because the run was cancelled,
    /// as opposed to the page itself failing
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<HttpError> for FetchError {
    fn from(error: HttpError) -> Self {
        if error.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Http(error)
        }
    }
}

/// A failed crawl task, carrying the page it was for
#[derive(Debug, Error)]
#[error("Failed to crawl '{page}': {source}")]
pub struct CrawlError {
    pub page: String,
    #[source]
    pub source: FetchError,
}

impl CrawlError {
    pub fn is_cancelled(&self) -> bool {
        self.source.is_cancelled()
    }
}
