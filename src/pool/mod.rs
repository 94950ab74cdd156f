//! Bounded-concurrency task execution
//!
//! This module contains:
//! - The [`Task`] capability: anything that can be processed under a
//!   cancellation token, yielding an output or an error
//! - A generic [`WorkerPool`] running a fixed number of workers over a
//!   bounded submission queue, publishing outcomes on two output queues

mod worker_pool;

pub use worker_pool::{PoolOutputs, WorkerPool};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A unit of work schedulable on a [`WorkerPool`]
#[async_trait]
pub trait Task: Send + Sync + 'static {
    type Output: Send + 'static;
    type Error: Send + 'static;

    /// Processes the task. Implementations must return promptly once
    /// `cancel` fires.
    async fn process(&self, cancel: &CancellationToken) -> Result<Self::Output, Self::Error>;
}

/// Errors reported by pool operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("Worker pool was cancelled")]
    Cancelled,

    #[error("Worker pool is shut down")]
    Closed,

    #[error("Worker pool outputs were already taken")]
    OutputsTaken,
}

/// Lifecycle of a worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolState {
    /// Queues allocated, no workers running
    Created,

    /// Workers are running and submissions are accepted
    Started,

    /// Submissions are closed, queued and in-flight tasks are finishing
    Draining,

    /// Every worker has exited and both output queues are closed
    Closed,
}

impl PoolState {
    /// Returns true if the pool still accepts submissions
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, Self::Created | Self::Started)
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Draining => "draining",
            Self::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}
