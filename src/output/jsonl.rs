//! JSON-lines record output
//!
//! Writes one `{"name": ..., "neighbors": [...]}` object per line, ready to be
//! replayed into the persistence layer's create operation.

use super::traits::{OutputResult, RecordSink};
use crate::crawler::PageRecord;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Appends page records to a JSON-lines file
pub struct JsonLinesSink {
    writer: BufWriter<File>,
    written: u64,
}

impl JsonLinesSink {
    /// Creates (or truncates) the file at `path`
    pub async fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(path).await?;

        Ok(Self {
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Number of records written so far
    pub fn written(&self) -> u64 {
        self.written
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn write_record(&mut self, record: &PageRecord) -> OutputResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush().await?;
        tracing::debug!("Flushed {} records", self.written);
        Ok(())
    }
}
