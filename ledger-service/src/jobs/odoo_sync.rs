//! `odoo-sync` processor (spec §4.8 table: "External ERP fan-out
//! *(optional)*"). Odoo ERP write-back is an explicit non-goal (spec §1);
//! this processor only reserves the queue slot so `addJob("odoo-sync", …)`
//! and `getJobStatus()` behave per contract without this service actually
//! talking to Odoo.

use async_trait::async_trait;

use ledger_scheduler::{JobContext, JobProcessor, JobRecord, ProgressReporter};
use ledger_shared::AppResult;

pub struct OdooSyncProcessor;

#[async_trait]
impl JobProcessor for OdooSyncProcessor {
    async fn process(
        &self,
        _job: &JobRecord,
        _ctx: &JobContext,
        progress: &dyn ProgressReporter,
    ) -> AppResult<serde_json::Value> {
        tracing::info!("odoo-sync ran (write-back out of scope, no-op)");
        progress.report(100);
        Ok(serde_json::json!({ "status": "no-op" }))
    }
}
