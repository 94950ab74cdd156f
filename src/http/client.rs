//! Retrying HTTP client
//!
//! This module handles every outbound request of a crawl:
//! - Building one pooled client with the configured timeouts and caps
//! - Retrying transport failures and 5xx responses
//! - Exponential backoff between attempts
//! - Abandoning requests and backoff waits on cancellation

use super::HttpError;
use crate::config::HttpConfig;
use reqwest::{Client, Request, Response};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Largest exponent used for backoff, keeps `2^k` from overflowing
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Builds the pooled HTTP client shared by all workers
///
/// reqwest only bounds idle connections per host, so the per-host cap is
/// clamped by the global idle cap.
///
/// # Example
///
/// ```no_run
/// use link_ripple::config::HttpConfig;
/// use link_ripple::http::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let idle_per_host = config
        .max_connections_per_host
        .min(config.max_idle_connections);

    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .pool_max_idle_per_host(idle_per_host)
        .pool_idle_timeout(config.idle_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP client with bounded retries and exponential backoff
///
/// Cheap to share behind an `Arc`; the inner client is already pooled and
/// safe for concurrent use.
#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    client: Client,
    backoff_base: Duration,
}

impl RetryingHttpClient {
    /// Builds a client from configuration
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let client = build_http_client(config).map_err(HttpError::ClientBuild)?;
        Ok(Self::with_client(client, config.backoff_base()))
    }

    /// Wraps an existing client
    pub fn with_client(client: Client, backoff_base: Duration) -> Self {
        Self {
            client,
            backoff_base,
        }
    }

    /// The underlying client, for building requests
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Delay after failed attempt `attempt` (0-indexed): `base * 2^attempt`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(MAX_BACKOFF_SHIFT);
        self.backoff_base.saturating_mul(factor)
    }

    /// Executes a request with retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Status < 500 | Returned immediately |
    /// | Status >= 500 | Retry after backoff |
    /// | Transport error | Retry after backoff |
    /// | Cancellation | `HttpError::Cancelled` immediately |
    ///
    /// After `max_attempts` failures the last observed error is returned.
    /// A budget of zero is treated as a single attempt.
    pub async fn execute(
        &self,
        request: Request,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<Response, HttpError> {
        let attempts = max_attempts.max(1);
        let url = request.url().to_string();
        let mut pending = Some(request);
        let mut last_error = None;

        for attempt in 0..attempts {
            if cancel.is_cancelled() {
                return Err(HttpError::Cancelled);
            }

            // Keep a pristine copy for the next attempt, the last one consumes the original
            let current = if attempt + 1 < attempts {
                pending
                    .as_ref()
                    .and_then(Request::try_clone)
                    .ok_or_else(|| HttpError::UnclonableRequest { url: url.clone() })?
            } else {
                pending
                    .take()
                    .ok_or_else(|| HttpError::UnclonableRequest { url: url.clone() })?
            };

            tracing::debug!("GET {} (attempt {}/{})", url, attempt + 1, attempts);

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(HttpError::Cancelled),
                outcome = self.client.execute(current) => outcome,
            };

            let error = match outcome {
                Ok(response) if response.status().as_u16() < 500 => return Ok(response),
                Ok(response) => HttpError::ServerStatus {
                    url: url.clone(),
                    status: response.status().as_u16(),
                },
                Err(source) => HttpError::Transport {
                    url: url.clone(),
                    source,
                },
            };

            if attempt + 1 < attempts {
                let delay = self.backoff_delay(attempt);
                tracing::warn!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    attempt + 1,
                    attempts,
                    error,
                    delay
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(HttpError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            last_error = Some(error);
        }

        Err(last_error.unwrap_or(HttpError::Cancelled))
    }
}
