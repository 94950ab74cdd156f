//! Record sink traits and types
//!
//! This module defines the boundary between the crawler and whatever
//! persists its output. A sink receives every successfully crawled page.

use crate::crawler::PageRecord;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for crawled page records
///
/// Records arrive from a single consumer task, in completion order.
#[async_trait]
pub trait RecordSink: Send {
    /// Records one successfully crawled page
    async fn write_record(&mut self, record: &PageRecord) -> OutputResult<()>;

    /// Flushes buffered output at the end of a run
    async fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

/// Sink that only logs each record
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl RecordSink for LogSink {
    async fn write_record(&mut self, record: &PageRecord) -> OutputResult<()> {
        tracing::info!(
            "Processed page '{}' ({} neighbors)",
            record.name,
            record.neighbors.len()
        );
        Ok(())
    }
}

/// Sink that keeps records in memory, shared with its creator
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<PageRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records written so far
    pub fn records(&self) -> Vec<PageRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write_record(&mut self, record: &PageRecord) -> OutputResult<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}
