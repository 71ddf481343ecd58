//! Named queue state (spec §4.8)
//!
//! Each queue holds a FIFO waiting list, a slot for the single job
//! currently active (concurrency = 1 per queue, spec P8), and capped
//! completed/failed retention with FIFO eviction. Job lookups by id use
//! a [`DashMap`] so status queries never contend with the waiting-list
//! mutex.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use crate::job::{JobRecord, JobStatus};

/// Static configuration for one named queue (spec §4.8 table).
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    pub name: &'static str,
    pub attempts: u32,
    pub backoff_base_secs: u64,
    pub cron: &'static str,
    pub retain_completed: usize,
    pub retain_failed: usize,
}

/// The five named queues and their defaults (spec §4.8). Cron expressions
/// here are the 5-field form from the spec; [`crate::scheduler::Scheduler`]
/// adapts them to `tokio-cron-scheduler`'s seconds-first syntax.
pub const QUEUE_DEFS: &[QueueConfig] = &[
    QueueConfig { name: "inventory-sync", attempts: 3, backoff_base_secs: 60, cron: "*/10 * * * *", retain_completed: 100, retain_failed: 100 },
    QueueConfig { name: "gl-export", attempts: 3, backoff_base_secs: 60, cron: "0 8 * * *", retain_completed: 100, retain_failed: 100 },
    QueueConfig { name: "banner-sync", attempts: 2, backoff_base_secs: 60, cron: "0 5 * * *", retain_completed: 100, retain_failed: 100 },
    QueueConfig { name: "hourly-sales", attempts: 2, backoff_base_secs: 60, cron: "0 * * * *", retain_completed: 100, retain_failed: 100 },
    QueueConfig { name: "odoo-sync", attempts: 3, backoff_base_secs: 60, cron: "5,20,35,50 * * * *", retain_completed: 100, retain_failed: 100 },
];

pub fn find_queue_config(name: &str) -> Option<&'static QueueConfig> {
    QUEUE_DEFS.iter().find(|q| q.name == name)
}

#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct QueueCounts {
    pub waiting: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}

pub struct Queue {
    pub config: QueueConfig,
    jobs: DashMap<Uuid, JobRecord>,
    waiting: Mutex<VecDeque<Uuid>>,
    completed: Mutex<VecDeque<Uuid>>,
    failed: Mutex<VecDeque<Uuid>>,
    notify: Notify,
}

impl Queue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            jobs: DashMap::new(),
            waiting: Mutex::new(VecDeque::new()),
            completed: Mutex::new(VecDeque::new()),
            failed: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Push a new or retried job onto the back of the waiting list and
    /// wake one waiting worker.
    pub async fn push(&self, job: JobRecord) {
        let id = job.id;
        self.jobs.insert(id, job);
        self.waiting.lock().await.push_back(id);
        self.notify.notify_one();
    }

    /// Wait until a job is available, pop it from the front, and mark it
    /// active. Returns the job record (cloned out for the worker to own
    /// during processing).
    pub async fn pop_and_activate(&self) -> JobRecord {
        loop {
            {
                let mut waiting = self.waiting.lock().await;
                if let Some(id) = waiting.pop_front() {
                    drop(waiting);
                    if let Some(mut entry) = self.jobs.get_mut(&id) {
                        entry.status = JobStatus::Active;
                        return entry.clone();
                    }
                    continue;
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn update(&self, id: Uuid, f: impl FnOnce(&mut JobRecord)) {
        if let Some(mut entry) = self.jobs.get_mut(&id) {
            f(&mut entry);
        }
    }

    pub async fn mark_completed(&self, id: Uuid, result: serde_json::Value) {
        self.update(id, |job| {
            job.status = JobStatus::Completed;
            job.progress = 100;
            job.result = Some(result);
        });
        let mut completed = self.completed.lock().await;
        completed.push_back(id);
        while completed.len() > self.config.retain_completed {
            if let Some(evicted) = completed.pop_front() {
                self.jobs.remove(&evicted);
            }
        }
    }

    pub async fn mark_failed(&self, id: Uuid, error: String) {
        self.update(id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(error);
        });
        let mut failed = self.failed.lock().await;
        failed.push_back(id);
        while failed.len() > self.config.retain_failed {
            if let Some(evicted) = failed.pop_front() {
                self.jobs.remove(&evicted);
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs.get(&id).map(|e| e.clone())
    }

    pub async fn counts(&self) -> QueueCounts {
        QueueCounts {
            waiting: self.waiting.lock().await.len(),
            active: self
                .jobs
                .iter()
                .filter(|e| e.status == JobStatus::Active)
                .count(),
            completed: self.completed.lock().await.len(),
            failed: self.failed.lock().await.len(),
        }
    }
}

pub type SharedQueue = Arc<Queue>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobOptions;
    use std::time::Duration;

    fn make_job(queue: &str) -> JobRecord {
        JobRecord::new(queue, serde_json::json!({}), &JobOptions::default(), 3, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn pop_and_activate_marks_job_active() {
        let queue = Queue::new(QUEUE_DEFS[0]);
        let job = make_job("inventory-sync");
        let id = job.id;
        queue.push(job).await;

        let activated = queue.pop_and_activate().await;
        assert_eq!(activated.id, id);
        assert_eq!(activated.status, JobStatus::Active);
    }

    #[tokio::test]
    async fn retains_completed_jobs_up_to_cap() {
        let mut config = QUEUE_DEFS[0];
        config.retain_completed = 2;
        let queue = Queue::new(config);

        for _ in 0..3 {
            let job = make_job("inventory-sync");
            let id = job.id;
            queue.push(job).await;
            let _ = queue.pop_and_activate().await;
            queue.mark_completed(id, serde_json::json!(null)).await;
        }

        let counts = queue.counts().await;
        assert_eq!(counts.completed, 2);
    }

    #[tokio::test]
    async fn fifo_ordering_within_a_queue() {
        let queue = Queue::new(QUEUE_DEFS[0]);
        let first = make_job("inventory-sync");
        let second = make_job("inventory-sync");
        let first_id = first.id;
        let second_id = second.id;
        queue.push(first).await;
        queue.push(second).await;

        assert_eq!(queue.pop_and_activate().await.id, first_id);
        assert_eq!(queue.pop_and_activate().await.id, second_id);
    }
}
