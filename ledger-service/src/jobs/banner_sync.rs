//! `banner-sync` processor (spec §4.8 table: "Retailer banner refresh
//! (peripheral)"). Retailer-banner metadata refresh lives outside this
//! service's data model; the queue and schedule exist so the slot is
//! reserved and its job-status counters show up alongside the others,
//! but the job itself only logs that it ran.

use async_trait::async_trait;

use ledger_scheduler::{JobContext, JobProcessor, JobRecord, ProgressReporter};
use ledger_shared::AppResult;

pub struct BannerSyncProcessor;

#[async_trait]
impl JobProcessor for BannerSyncProcessor {
    async fn process(
        &self,
        _job: &JobRecord,
        ctx: &JobContext,
        progress: &dyn ProgressReporter,
    ) -> AppResult<serde_json::Value> {
        tracing::info!(stores = ctx.stores.len(), "banner-sync ran (peripheral, no-op)");
        progress.report(100);
        Ok(serde_json::json!({ "status": "no-op" }))
    }
}
