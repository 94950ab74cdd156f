//! Generic worker pool
//!
//! Tasks flow through a bounded submission queue to a fixed set of workers.
//! Each outcome is published on the result queue or the error queue. Both
//! output queues close when the last worker exits, which only happens after
//! [`WorkerPool::shutdown`] has closed the submission path and every queued
//! task has been processed.

use super::{PoolError, PoolState, Task};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;

/// Receiving ends of a pool's output queues
pub struct PoolOutputs<T: Task> {
    /// Successful task outputs
    pub results: mpsc::Receiver<T::Output>,

    /// Task failures
    pub errors: mpsc::Receiver<T::Error>,
}

struct Inner<T: Task> {
    state: PoolState,
    submit_tx: Option<mpsc::Sender<T>>,
    submit_rx: Option<mpsc::Receiver<T>>,
    results_tx: Option<mpsc::Sender<T::Output>>,
    errors_tx: Option<mpsc::Sender<T::Error>>,
    outputs: Option<PoolOutputs<T>>,
    handles: Vec<JoinHandle<()>>,
}

/// Bounded-concurrency executor for any [`Task`]
///
/// The pool coordinates:
/// - A bounded submission queue (`submit` waits while it is full)
/// - Exactly `workers` concurrent worker loops
/// - Two bounded output queues that must be drained concurrently
///
/// Cancellation does not stop the workers. They keep draining the queue and
/// hand each task the cancelled token so it fails fast; this way every
/// accepted task still produces exactly one outcome.
pub struct WorkerPool<T: Task> {
    workers: usize,
    cancel: CancellationToken,
    closed: CancellationToken,
    inner: Mutex<Inner<T>>,
}

impl<T: Task> WorkerPool<T> {
    /// Creates a pool bound to `cancel`; no workers run until [`start`](Self::start)
    ///
    /// Zero sizes are raised to one.
    pub fn new(config: &PoolConfig, cancel: CancellationToken) -> Self {
        let (submit_tx, submit_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (results_tx, results) = mpsc::channel(config.output_capacity.max(1));
        let (errors_tx, errors) = mpsc::channel(config.output_capacity.max(1));

        Self {
            workers: config.workers.max(1),
            cancel,
            closed: CancellationToken::new(),
            inner: Mutex::new(Inner {
                state: PoolState::Created,
                submit_tx: Some(submit_tx),
                submit_rx: Some(submit_rx),
                results_tx: Some(results_tx),
                errors_tx: Some(errors_tx),
                outputs: Some(PoolOutputs { results, errors }),
                handles: Vec::new(),
            }),
        }
    }

    /// Number of workers this pool runs
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        self.lock().state
    }

    /// Spawns the workers. Only the first call has an effect.
    pub fn start(&self) {
        let mut inner = self.lock();
        if inner.state != PoolState::Created {
            return;
        }
        self.spawn_workers(&mut inner);
        inner.state = PoolState::Started;
        tracing::debug!("Worker pool started with {} workers", self.workers);
    }

    /// Takes the output queues. They can be taken once.
    pub fn outputs(&self) -> Result<PoolOutputs<T>, PoolError> {
        self.lock().outputs.take().ok_or(PoolError::OutputsTaken)
    }

    /// Enqueues a task, waiting while the submission queue is full
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The task was queued and will produce one outcome
    /// * `Err(PoolError::Cancelled)` - The pool's token fired before the task was queued
    /// * `Err(PoolError::Closed)` - `shutdown` has already been called
    pub async fn submit(&self, task: T) -> Result<(), PoolError> {
        if self.cancel.is_cancelled() {
            return Err(PoolError::Cancelled);
        }

        let sender = {
            let inner = self.lock();
            if !inner.state.accepts_submissions() {
                return Err(PoolError::Closed);
            }
            inner.submit_tx.clone().ok_or(PoolError::Closed)?
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PoolError::Cancelled),
            sent = sender.send(task) => sent.map_err(|_| PoolError::Closed),
        }
    }

    /// Stops accepting work and waits for every queued and in-flight task
    ///
    /// Output queues are closed once the last worker exits. A pool that was
    /// never started is started first so queued tasks are still processed.
    /// Later calls return once the first one has finished.
    pub async fn shutdown(&self) {
        let handles = {
            let mut inner = self.lock();
            match inner.state {
                PoolState::Draining | PoolState::Closed => None,
                PoolState::Created | PoolState::Started => {
                    if inner.state == PoolState::Created {
                        self.spawn_workers(&mut inner);
                    }
                    inner.state = PoolState::Draining;
                    inner.submit_tx = None;
                    inner.results_tx = None;
                    inner.errors_tx = None;
                    Some(std::mem::take(&mut inner.handles))
                }
            }
        };

        let Some(handles) = handles else {
            self.closed.cancelled().await;
            return;
        };

        tracing::debug!("Draining worker pool");
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker exited abnormally: {}", e);
            }
        }

        self.lock().state = PoolState::Closed;
        self.closed.cancel();
        tracing::debug!("Worker pool closed");
    }

    fn spawn_workers(&self, inner: &mut Inner<T>) {
        let Some(receiver) = inner.submit_rx.take() else {
            return;
        };
        let (Some(results), Some(errors)) = (inner.results_tx.clone(), inner.errors_tx.clone())
        else {
            return;
        };

        let queue = Arc::new(tokio::sync::Mutex::new(receiver));
        for id in 0..self.workers {
            let worker = Worker {
                id,
                queue: Arc::clone(&queue),
                results: results.clone(),
                errors: errors.clone(),
                cancel: self.cancel.clone(),
            };
            inner.handles.push(tokio::spawn(worker.run()));
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct Worker<T: Task> {
    id: usize,
    queue: Arc<tokio::sync::Mutex<mpsc::Receiver<T>>>,
    results: mpsc::Sender<T::Output>,
    errors: mpsc::Sender<T::Error>,
    cancel: CancellationToken,
}

impl<T: Task> Worker<T> {
    async fn run(self) {
        loop {
            let next = self.queue.lock().await.recv().await;
            let Some(task) = next else {
                break;
            };

            match task.process(&self.cancel).await {
                Ok(output) => {
                    if self.results.send(output).await.is_err() {
                        tracing::warn!("Worker {}: result queue has no consumer", self.id);
                    }
                }
                Err(error) => {
                    if self.errors.send(error).await.is_err() {
                        tracing::warn!("Worker {}: error queue has no consumer", self.id);
                    }
                }
            }
        }

        tracing::trace!("Worker {} exiting", self.id);
    }
}
