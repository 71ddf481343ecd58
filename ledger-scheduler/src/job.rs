//! Job records and per-job options (spec §4.8, §6.4).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Waiting,
    Active,
    Completed,
    Failed,
}

/// Per-job overrides for the queue's defaults (spec §6.4 `addJob` options
/// subset: `{priority, attempts, backoff}`).
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub priority: i32,
    pub attempts: Option<u32>,
    pub backoff_base: Option<Duration>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            priority: 0,
            attempts: None,
            backoff_base: None,
        }
    }
}

/// A single job instance tracked by a queue. Progress is a coarse
/// 0..100 counter the processor updates at milestones (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub queue: String,
    pub data: serde_json::Value,
    pub status: JobStatus,
    pub progress: u8,
    pub attempts: u32,
    pub attempts_made: u32,
    #[serde(skip, default = "default_backoff")]
    pub backoff_base: Duration,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_backoff() -> Duration {
    Duration::from_secs(60)
}

impl JobRecord {
    pub fn new(queue: impl Into<String>, data: serde_json::Value, opts: &JobOptions, default_attempts: u32, default_backoff: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            queue: queue.into(),
            data,
            status: JobStatus::Waiting,
            progress: 0,
            attempts: opts.attempts.unwrap_or(default_attempts),
            attempts_made: 0,
            backoff_base: opts.backoff_base.unwrap_or(default_backoff),
            result: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Exponential backoff delay for the *next* attempt, given how many
    /// have already been made: `base * 2^(attempts_made - 1)`.
    pub fn next_backoff(&self) -> Duration {
        let exponent = self.attempts_made.saturating_sub(1);
        self.backoff_base * 2u32.saturating_pow(exponent)
    }

    pub fn can_retry(&self) -> bool {
        self.attempts_made < self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let mut job = JobRecord::new("gl-export", serde_json::json!({}), &JobOptions::default(), 3, Duration::from_secs(60));
        job.attempts_made = 1;
        assert_eq!(job.next_backoff(), Duration::from_secs(60));
        job.attempts_made = 2;
        assert_eq!(job.next_backoff(), Duration::from_secs(120));
        job.attempts_made = 3;
        assert_eq!(job.next_backoff(), Duration::from_secs(240));
    }

    #[test]
    fn can_retry_respects_attempts_cap() {
        let mut job = JobRecord::new("gl-export", serde_json::json!({}), &JobOptions::default(), 2, Duration::from_secs(60));
        assert!(job.can_retry());
        job.attempts_made = 2;
        assert!(!job.can_retry());
    }
}
