//! ledger-scheduler — the Scheduler (C8) and Worker Pool (C9): named
//! queues driven by cron schedules, per-queue concurrency 1, exponential
//! retry, and graceful shutdown.

pub mod context;
pub mod job;
pub mod processor;
pub mod queue;
pub mod scheduler;
pub mod worker;

pub use context::{JobContext, SharedContext};
pub use job::{JobOptions, JobRecord, JobStatus};
pub use processor::{JobProcessor, ProgressReporter};
pub use queue::{Queue, QueueConfig, QueueCounts, SharedQueue, QUEUE_DEFS};
pub use scheduler::Scheduler;
pub use worker::WorkerPool;
