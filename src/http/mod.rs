//! Shared HTTP plumbing
//!
//! A single pooled `reqwest::Client` is built once per run and shared by every
//! worker. Requests go through [`RetryingHttpClient::execute`], which retries
//! transport failures and server errors with exponential backoff.

mod client;

pub use client::{build_http_client, RetryingHttpClient};

use thiserror::Error;

/// Errors produced by the retrying client
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Server error {status} for {url}")]
    ServerStatus { url: String, status: u16 },

    #[error("Request body cannot be replayed for {url}")]
    UnclonableRequest { url: String },

    #[error("Request cancelled")]
    Cancelled,
}

impl HttpError {
    /// Returns true when the request was abandoned because the run stopped
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
