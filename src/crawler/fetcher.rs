//! Paginated link fetcher
//!
//! This module walks the link API for one page:
//! - Building the `prop=links` query for the page and namespace
//! - Executing it through the shared retrying client
//! - Decoding the JSON body and keeping main-namespace links
//! - Following the continuation cursor until it runs out

use super::api::ApiResponse;
use super::FetchError;
use crate::config::ApiConfig;
use crate::http::RetryingHttpClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Fetches every outbound link of a page, one API page at a time
#[derive(Debug, Clone)]
pub struct LinkFetcher {
    http: Arc<RetryingHttpClient>,
    endpoint: Url,
    namespace: i64,
    page_limit: String,
    max_attempts: u32,
}

impl LinkFetcher {
    /// Creates a fetcher using the shared client and the API configuration
    pub fn new(http: Arc<RetryingHttpClient>, config: &ApiConfig) -> Result<Self, FetchError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|source| FetchError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            source,
        })?;

        Ok(Self {
            http,
            endpoint,
            namespace: config.namespace,
            page_limit: config.page_limit.clone(),
            max_attempts: config.max_attempts,
        })
    }

    /// Builds the API URL for `page`, resuming at `cursor` when given
    pub fn request_url(&self, page: &str, cursor: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("action", "query")
                .append_pair("prop", "links")
                .append_pair("format", "json")
                .append_pair("plnamespace", &self.namespace.to_string())
                .append_pair("pllimit", &self.page_limit)
                .append_pair("titles", page);
            if let Some(cursor) = cursor {
                query.append_pair("plcontinue", cursor);
            }
        }
        url
    }

    /// Fetches all links of `page` in the configured namespace
    ///
    /// # Request Flow
    ///
    /// 1. Check for cancellation
    /// 2. Request the next batch (retried by the HTTP client)
    /// 3. Decode and append matching links in response order
    /// 4. Repeat while the response carries a non-empty cursor
    ///
    /// Links already gathered are discarded when a later batch fails. A page
    /// without links, or one the API does not know, yields an empty list.
    pub async fn fetch_links(
        &self,
        page: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, FetchError> {
        let mut links = Vec::new();
        let mut cursor: Option<String> = None;
        let mut batches = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let url = self.request_url(page, cursor.as_deref());
            let request = self
                .http
                .client()
                .get(url)
                .build()
                .map_err(FetchError::Request)?;

            let response = self
                .http
                .execute(request, self.max_attempts, cancel)
                .await
                .map_err(FetchError::from)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                });
            }

            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                body = response.bytes() => body.map_err(FetchError::Body)?,
            };
            let decoded: ApiResponse = serde_json::from_slice(&body)?;

            links.extend(decoded.links_in_namespace(self.namespace).map(str::to_owned));
            batches += 1;

            match decoded.cursor() {
                Some(next) => cursor = Some(next.to_owned()),
                None => break,
            }
        }

        tracing::debug!(
            "Fetched {} links for {} in {} batch(es)",
            links.len(),
            page,
            batches
        );

        Ok(links)
    }
}
