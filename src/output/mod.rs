//! Output module for crawl records and run reports
//!
//! This module handles:
//! - Delivering page records to a sink (JSON-lines file, log, memory)
//! - Summarizing a run's outcome counts and timing

mod jsonl;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use stats::{print_report, CrawlReport, RunStatus};
pub use traits::{LogSink, MemorySink, OutputError, OutputResult, RecordSink};

use crate::config::OutputConfig;

/// Opens the sink described by the output configuration
///
/// A configured records path gets a JSON-lines file; otherwise records are
/// only logged.
pub async fn open_sink(config: &OutputConfig) -> OutputResult<Box<dyn RecordSink>> {
    match &config.records_path {
        Some(path) => {
            tracing::info!("Writing records to {}", path.display());
            Ok(Box::new(JsonLinesSink::create(path).await?))
        }
        None => Ok(Box::new(LogSink)),
    }
}
