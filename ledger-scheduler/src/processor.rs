//! Job processor contract (spec §4.8 "Workers")
//!
//! Each queue is wired to exactly one processor at startup. A processor
//! receives the job it's asked to run and the current shared context, and
//! returns either a JSON result or an error; the worker pool owns retry
//! and progress bookkeeping around it.

use async_trait::async_trait;

use ledger_shared::AppResult;

use crate::context::JobContext;
use crate::job::JobRecord;

/// Reports coarse progress milestones back to the owning worker, which
/// updates the job record (spec §4.8 "progress counter 0..100").
pub trait ProgressReporter: Send + Sync {
    fn report(&self, percent: u8);
}

#[async_trait]
pub trait JobProcessor: Send + Sync {
    /// Run one job to completion. `progress` may be called any number of
    /// times with a monotonically non-decreasing percentage.
    async fn process(
        &self,
        job: &JobRecord,
        ctx: &JobContext,
        progress: &dyn ProgressReporter,
    ) -> AppResult<serde_json::Value>;
}
