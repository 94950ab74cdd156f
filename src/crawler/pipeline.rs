//! Crawl pipeline - run orchestration
//!
//! This module wires one bounded crawl run together:
//! - A deadline-bound cancellation token for the whole run
//! - A frontier reader feeding a bounded line queue
//! - Task submission into the worker pool (blocking on a full queue)
//! - Concurrent consumers for the result and error queues
//! - Shutdown, timing, and the final report

use super::frontier::{frontier_entry, read_frontier};
use super::{CrawlTask, LinkFetcher};
use crate::config::Config;
use crate::http::RetryingHttpClient;
use crate::output::{open_sink, CrawlReport, RecordSink, RunStatus};
use crate::pool::{PoolOutputs, WorkerPool};
use crate::RippleError;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One crawl run over a frontier file
///
/// The HTTP client and link fetcher are built here and handed to every task
/// explicitly; nothing is shared through globals.
pub struct CrawlPipeline {
    config: Config,
    http: Arc<RetryingHttpClient>,
    fetcher: Arc<LinkFetcher>,
    sink: Option<Box<dyn RecordSink>>,
}

impl CrawlPipeline {
    /// Creates a pipeline, building the shared HTTP client
    pub fn new(config: Config) -> Result<Self, RippleError> {
        let http = Arc::new(RetryingHttpClient::new(&config.http)?);
        let fetcher = Arc::new(LinkFetcher::new(Arc::clone(&http), &config.api)?);

        Ok(Self {
            config,
            http,
            fetcher,
            sink: None,
        })
    }

    /// Sends records to `sink` instead of the configured output
    pub fn with_sink(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// The shared HTTP client
    pub fn http_client(&self) -> &Arc<RetryingHttpClient> {
        &self.http
    }

    /// Runs the crawl until the frontier is exhausted, the deadline passes,
    /// or `cancel` fires
    ///
    /// Every accepted task is accounted for in the report: its record or its
    /// error was observed before this returns. A frontier read failure
    /// cancels outstanding work and is returned as `RippleError::Frontier`,
    /// carrying the report, once the pool has drained.
    pub async fn run(self, cancel: CancellationToken) -> Result<CrawlReport, RippleError> {
        let Self {
            config,
            fetcher,
            sink,
            ..
        } = self;

        let started_at = Utc::now();
        let start = Instant::now();
        tracing::info!(
            "Crawling started: frontier {}, {} workers, deadline {:?}",
            config.crawler.frontier_path.display(),
            config.pool.workers,
            config.crawler.deadline()
        );

        let sink = match sink {
            Some(sink) => sink,
            None => open_sink(&config.output).await?,
        };

        // Early returns below must still stop the deadline timer
        let run = cancel.child_token();
        let _stop_run = run.clone().drop_guard();
        let deadline = spawn_deadline(run.clone(), config.crawler.deadline());

        let pool = WorkerPool::<CrawlTask>::new(&config.pool, run.clone());
        pool.start();
        let PoolOutputs { results, errors } = pool.outputs()?;
        let records = spawn_record_consumer(results, sink);
        let failures = spawn_error_consumer(errors);

        let (line_tx, mut line_rx) = mpsc::channel(config.crawler.frontier_buffer.max(1));
        let frontier_path = config.crawler.frontier_path.clone();
        let reader = {
            let path = frontier_path.clone();
            let run = run.clone();
            tokio::spawn(async move {
                let result = read_frontier(&path, line_tx, &run).await;
                if let Err(e) = &result {
                    tracing::error!("Failed to read frontier {}: {}", path.display(), e);
                    run.cancel();
                }
                result
            })
        };

        let mut submitted = 0u64;
        while let Some(line) = line_rx.recv().await {
            let Some(page) = frontier_entry(&line) else {
                continue;
            };

            // Blocks while the pool's queue is full
            if let Err(e) = pool.submit(CrawlTask::new(page, Arc::clone(&fetcher))).await {
                tracing::warn!("Stopped submitting at '{}': {}", page, e);
                break;
            }
            submitted += 1;
        }
        drop(line_rx);

        pool.shutdown().await;

        let read_result = reader.await?;
        let (succeeded, total_links, sink_result) = records.await?;
        let (failed, cancelled) = failures.await?;

        deadline.abort();
        let deadline_hit = matches!(deadline.await, Ok(true));

        let status = if deadline_hit {
            RunStatus::DeadlineExceeded
        } else if run.is_cancelled() {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        run.cancel();

        let elapsed = start.elapsed();
        let report = CrawlReport {
            started_at,
            finished_at: Utc::now(),
            elapsed,
            submitted,
            succeeded,
            failed,
            cancelled,
            total_links,
            status,
        };

        tracing::info!(
            "Crawling {} in {}s: {} submitted, {} succeeded, {} failed ({} cancelled), {} links",
            status,
            elapsed.as_secs(),
            submitted,
            succeeded,
            failed,
            cancelled,
            total_links
        );

        if let Err(source) = read_result {
            return Err(RippleError::Frontier {
                path: frontier_path,
                source,
                report: Box::new(report),
            });
        }
        sink_result?;

        Ok(report)
    }
}

/// Cancels `run` after `deadline`; yields true if it was the one to cancel
fn spawn_deadline(run: CancellationToken, deadline: Duration) -> JoinHandle<bool> {
    tokio::spawn(async move {
        tokio::select! {
            _ = run.cancelled() => false,
            _ = tokio::time::sleep(deadline) => {
                tracing::warn!("Run deadline of {:?} reached, cancelling", deadline);
                run.cancel();
                true
            }
        }
    })
}

/// Drains the result queue into the sink; yields (records, links, flush result)
fn spawn_record_consumer(
    mut results: mpsc::Receiver<super::PageRecord>,
    mut sink: Box<dyn RecordSink>,
) -> JoinHandle<(u64, u64, crate::output::OutputResult<()>)> {
    tokio::spawn(async move {
        let mut records = 0u64;
        let mut links = 0u64;

        while let Some(record) = results.recv().await {
            records += 1;
            links += record.neighbors.len() as u64;
            if let Err(e) = sink.write_record(&record).await {
                tracing::error!("Failed to write record for '{}': {}", record.name, e);
            }
        }

        (records, links, sink.finish().await)
    })
}

/// Drains the error queue; yields (errors, of which cancellations)
fn spawn_error_consumer(mut errors: mpsc::Receiver<super::CrawlError>) -> JoinHandle<(u64, u64)> {
    tokio::spawn(async move {
        let mut failed = 0u64;
        let mut cancelled = 0u64;

        while let Some(error) = errors.recv().await {
            failed += 1;
            if error.is_cancelled() {
                cancelled += 1;
                tracing::debug!("{}", error);
            } else {
                tracing::error!("Crawl error: {}", error);
            }
        }

        (failed, cancelled)
    })
}

/// Runs a complete crawl with the configured output
///
/// # Example
///
/// ```no_run
/// use link_ripple::config::load_config;
/// use link_ripple::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(config, CancellationToken::new()).await?;
/// println!("{} pages crawled", report.succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    cancel: CancellationToken,
) -> Result<CrawlReport, RippleError> {
    CrawlPipeline::new(config)?.run(cancel).await
}
