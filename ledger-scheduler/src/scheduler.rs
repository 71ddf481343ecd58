//! Scheduler (C8)
//!
//! Owns the cron-driven repeatable registrations, one per named queue,
//! and the one-off `add` API (spec §4.8, §6.4). On (re)start all
//! previously tracked repeatable registrations are removed before the
//! current schedule table is re-applied, so restarting the process never
//! accumulates duplicate cron entries (spec P7, S6).

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use cron::Schedule;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use ledger_shared::{AppError, AppResult};

use crate::job::{JobOptions, JobRecord};
use crate::queue::{find_queue_config, QueueCounts, SharedQueue, QUEUE_DEFS};

/// `tokio-cron-scheduler` expects a seconds-first cron expression; the
/// spec's schedule table is the conventional 5-field form. Prepending a
/// literal `0` seconds field is a straight syntax adapter, not a policy
/// change (spec §4.8 table is unchanged in meaning).
fn to_seconds_first_cron(expr: &str) -> String {
    format!("0 {expr}")
}

pub struct Scheduler {
    inner: JobScheduler,
    queues: HashMap<&'static str, SharedQueue>,
    registered_ids: Vec<Uuid>,
}

impl Scheduler {
    pub async fn new(queues: HashMap<&'static str, SharedQueue>) -> AppResult<Self> {
        let inner = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("failed to create job scheduler: {e}")))?;
        Ok(Self {
            inner,
            queues,
            registered_ids: Vec::new(),
        })
    }

    /// Drop every previously registered repeatable job, then register a
    /// fresh one per entry in [`QUEUE_DEFS`]. Idempotent: calling this
    /// twice in the same process yields the same five registrations
    /// (spec P7).
    pub async fn register_repeatables(&mut self) -> AppResult<()> {
        for id in self.registered_ids.drain(..) {
            self.inner
                .remove(&id)
                .await
                .map_err(|e| AppError::internal(format!("failed to remove stale schedule entry: {e}")))?;
        }

        for config in QUEUE_DEFS {
            let Some(queue) = self.queues.get(config.name).cloned() else {
                continue;
            };
            let cron_expr = to_seconds_first_cron(config.cron);
            let queue_name = config.name;
            let attempts = config.attempts;
            let backoff = std::time::Duration::from_secs(config.backoff_base_secs);

            // `tokio-cron-scheduler` accepts malformed expressions silently
            // until the next tick; validate eagerly with the reference cron
            // parser so a typo in QUEUE_DEFS fails at startup, not 3am.
            Schedule::from_str(&cron_expr)
                .map_err(|e| AppError::internal(format!("invalid cron expression for queue '{queue_name}': {e}")))?;

            let job = Job::new_async(cron_expr.as_str(), move |_uuid, _l| {
                let queue = queue.clone();
                Box::pin(async move {
                    let record = JobRecord::new(queue_name, serde_json::json!({}), &JobOptions::default(), attempts, backoff);
                    tracing::info!(queue = queue_name, job_id = %record.id, "repeatable job fired");
                    queue.push(record).await;
                })
            })
            .map_err(|e| AppError::internal(format!("invalid cron expression for queue '{queue_name}': {e}")))?;

            let id = self
                .inner
                .add(job)
                .await
                .map_err(|e| AppError::internal(format!("failed to register schedule for queue '{queue_name}': {e}")))?;
            self.registered_ids.push(id);
        }

        Ok(())
    }

    pub async fn start(&mut self) -> AppResult<()> {
        self.inner
            .start()
            .await
            .map_err(|e| AppError::internal(format!("failed to start scheduler: {e}")))
    }

    /// One-off enqueue (spec §6.4 `addJob`). An unknown queue name is a
    /// fatal error, not a per-store failure.
    pub async fn add(&self, queue_name: &str, data: serde_json::Value, opts: JobOptions) -> AppResult<Uuid> {
        let queue = self
            .queues
            .get(queue_name)
            .ok_or_else(|| AppError::unknown_queue(queue_name))?;
        let config = find_queue_config(queue_name).expect("queue registered without a matching config");
        let record = JobRecord::new(
            queue_name,
            data,
            &opts,
            config.attempts,
            std::time::Duration::from_secs(config.backoff_base_secs),
        );
        let id = record.id;
        queue.push(record).await;
        Ok(id)
    }

    /// `getJobStatus` (spec §6.4): per-queue waiting/active/completed/failed counts.
    pub async fn job_status(&self) -> HashMap<&'static str, QueueCounts> {
        let mut statuses = HashMap::new();
        for (name, queue) in &self.queues {
            statuses.insert(*name, queue.counts().await);
        }
        statuses
    }

    /// Stop the cron driver. Idempotent (spec §6.4 `shutdown()`).
    pub async fn shutdown(mut self) -> AppResult<()> {
        self.inner
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("failed to shut down scheduler: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Queue;

    fn all_queues() -> HashMap<&'static str, SharedQueue> {
        QUEUE_DEFS.iter().map(|c| (c.name, Arc::new(Queue::new(*c)))).collect()
    }

    #[test]
    fn seconds_first_cron_adapter_prepends_zero() {
        assert_eq!(to_seconds_first_cron("*/10 * * * *"), "0 */10 * * * *");
        assert_eq!(to_seconds_first_cron("0 8 * * *"), "0 0 8 * * *");
    }

    #[tokio::test]
    async fn registering_twice_yields_the_same_registration_count_p7_s6() {
        let mut scheduler = Scheduler::new(all_queues()).await.unwrap();
        scheduler.register_repeatables().await.unwrap();
        assert_eq!(scheduler.registered_ids.len(), QUEUE_DEFS.len());

        scheduler.register_repeatables().await.unwrap();
        assert_eq!(scheduler.registered_ids.len(), QUEUE_DEFS.len());
    }

    #[tokio::test]
    async fn add_to_unknown_queue_is_fatal() {
        let scheduler = Scheduler::new(all_queues()).await.unwrap();
        let err = scheduler.add("no-such-queue", serde_json::json!({}), JobOptions::default()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn add_enqueues_a_waiting_job() {
        let scheduler = Scheduler::new(all_queues()).await.unwrap();
        scheduler.add("gl-export", serde_json::json!({"date": "2026-01-06"}), JobOptions::default()).await.unwrap();
        let status = scheduler.job_status().await;
        assert_eq!(status["gl-export"].waiting, 1);
    }
}
