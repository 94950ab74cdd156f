//! Crawl task - one frontier entry scheduled on the worker pool
//!
//! A task pairs a page name with the shared link fetcher. Failures keep the
//! page name so the error queue can report which entry was lost.

use super::{CrawlError, LinkFetcher, PageRecord};
use crate::pool::Task;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Crawls one frontier entry
#[derive(Debug, Clone)]
pub struct CrawlTask {
    page: String,
    fetcher: Arc<LinkFetcher>,
}

impl CrawlTask {
    pub fn new(page: impl Into<String>, fetcher: Arc<LinkFetcher>) -> Self {
        Self {
            page: page.into(),
            fetcher,
        }
    }

    pub fn page(&self) -> &str {
        &self.page
    }
}

#[async_trait]
impl Task for CrawlTask {
    type Output = PageRecord;
    type Error = CrawlError;

    async fn process(&self, cancel: &CancellationToken) -> Result<PageRecord, CrawlError> {
        match self.fetcher.fetch_links(&self.page, cancel).await {
            Ok(neighbors) => Ok(PageRecord {
                name: self.page.clone(),
                neighbors,
            }),
            Err(source) => Err(CrawlError {
                page: self.page.clone(),
                source,
            }),
        }
    }
}
