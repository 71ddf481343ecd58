//! Worker Pool (C9)
//!
//! One worker per queue, concurrency 1 within a queue, cross-queue
//! parallel (spec §4.8, §5). Each worker loops: pop a job, run its
//! processor, apply the retry/backoff policy on failure, and surface
//! `completed`/`failed`/`stalled`/`error` events via `tracing` the way the
//! Bull-style queue this replaces would emit them.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use ledger_shared::AppError;

use crate::context::SharedContext;
use crate::job::JobStatus;
use crate::processor::{JobProcessor, ProgressReporter};
use crate::queue::SharedQueue;

struct QueueProgress {
    queue: SharedQueue,
    job_id: uuid::Uuid,
}

impl ProgressReporter for QueueProgress {
    fn report(&self, percent: u8) {
        let id = self.job_id;
        self.queue.update(id, |job| job.progress = percent.min(100));
    }
}

async fn run_worker(queue: SharedQueue, processor: Arc<dyn JobProcessor>, ctx: SharedContext, cancel: CancellationToken) {
    loop {
        let job = tokio::select! {
            job = queue.pop_and_activate() => job,
            _ = cancel.cancelled() => {
                tracing::info!(queue = queue.config.name, "worker stopping: no job in flight");
                return;
            }
        };

        let id = job.id;
        let attempt = job.attempts_made + 1;
        queue.update(id, |j| j.attempts_made = attempt);

        tracing::info!(queue = queue.config.name, job_id = %id, attempt, "job started");

        let context_snapshot = ctx.load();
        let progress = QueueProgress { queue: queue.clone(), job_id: id };
        let outcome = processor.process(&job, &context_snapshot, &progress).await;

        match outcome {
            Ok(result) => {
                queue.mark_completed(id, result.clone()).await;
                tracing::info!(queue = queue.config.name, job_id = %id, "job completed");
            }
            Err(err) => {
                let current = queue.get(id).unwrap_or(job);
                if current.can_retry() {
                    let backoff = current.next_backoff();
                    tracing::warn!(
                        queue = queue.config.name,
                        job_id = %id,
                        error = %err.message,
                        retry_in_secs = backoff.as_secs(),
                        "job failed, will retry"
                    );
                    queue.update(id, |j| j.status = JobStatus::Waiting);
                    let retry_queue = queue.clone();
                    let retry_cancel = cancel.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = tokio::time::sleep(backoff) => {
                                if let Some(job) = retry_queue.get(id) {
                                    retry_queue.push(job).await;
                                }
                            }
                            _ = retry_cancel.cancelled() => {}
                        }
                    });
                } else {
                    tracing::error!(
                        queue = queue.config.name,
                        job_id = %id,
                        error = %err.message,
                        "job failed, exhausted retries"
                    );
                    queue.mark_failed(id, err.message.clone()).await;
                }
            }
        }
    }
}

/// Supervises one tokio task per registered queue. Mirrors the teacher's
/// background-task supervisor: named tasks, a shared cancellation token,
/// and an explicit `shutdown` that waits for every handle.
pub struct WorkerPool {
    handles: Vec<(&'static str, JoinHandle<()>)>,
    cancel: CancellationToken,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Register the single worker for a queue and start it. `queue.name`
    /// in [`crate::queue::QueueConfig`] must be unique; this is a
    /// programmer contract, not validated at runtime here.
    pub fn register(&mut self, queue: SharedQueue, processor: Arc<dyn JobProcessor>, ctx: SharedContext) {
        let name = queue.config.name;
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(run_worker(queue, processor, ctx, cancel));
        self.handles.push((name, handle));
    }

    /// Graceful shutdown: signal cancellation (workers finish their
    /// current job, then stop pulling new ones) and await every handle
    /// (spec §4.8 "close workers first").
    pub async fn shutdown(self) -> Result<(), AppError> {
        tracing::info!(workers = self.handles.len(), "shutting down worker pool");
        self.cancel.cancel();

        let mut failures = 0;
        for (name, handle) in self.handles {
            match handle.await {
                Ok(()) => tracing::debug!(queue = name, "worker stopped"),
                Err(e) => {
                    failures += 1;
                    tracing::error!(queue = name, error = ?e, "worker task panicked");
                }
            }
        }

        if failures > 0 {
            return Err(AppError::internal(format!("{failures} worker(s) failed to shut down cleanly")));
        }
        Ok(())
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}
