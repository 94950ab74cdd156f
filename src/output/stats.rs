//! Run statistics
//!
//! Counts gathered from the two output queues of a crawl, plus timing.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// The frontier was exhausted and every task finished
    Completed,

    /// The run deadline cancelled outstanding work
    DeadlineExceeded,

    /// An external interrupt or a frontier failure cancelled the run
    Interrupted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Completed => "completed",
            Self::DeadlineExceeded => "deadline exceeded",
            Self::Interrupted => "interrupted",
        };
        write!(f, "{}", name)
    }
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,

    /// Tasks accepted by the worker pool
    pub submitted: u64,

    /// Records published on the result queue
    pub succeeded: u64,

    /// Errors published on the error queue, cancellations included
    pub failed: u64,

    /// Subset of `failed` caused by cancellation
    pub cancelled: u64,

    /// Neighbors across all records
    pub total_links: u64,

    pub status: RunStatus,
}

impl CrawlReport {
    /// Outcomes observed on both queues
    pub fn outcomes(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Share of submitted tasks that produced a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.submitted == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.submitted as f64) * 100.0
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Run:");
    println!("  Status: {}", report.status);
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!("  Elapsed: {}s", report.elapsed.as_secs());
    println!();

    println!("Tasks:");
    println!("  Submitted: {}", report.submitted);
    println!("  Succeeded: {}", report.succeeded);
    println!("  Failed: {}", report.failed);
    if report.cancelled > 0 {
        println!("    of which cancelled: {}", report.cancelled);
    }
    println!("  Links found: {}", report.total_links);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} pages)",
        report.success_rate(),
        report.succeeded,
        report.submitted
    );
}
