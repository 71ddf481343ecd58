//! `gl-export` processor (spec §4.2-§4.3, §6.1): fetch every active
//! store's transactions for the report date, aggregate each into its 10
//! journal rows, and write one combined TSV/CSV pair covering all stores
//! (spec P6: row count = 10 × number of stores).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use ledger_gl::{file_names, render_csv, render_rows, render_tsv};
use ledger_pos_client::{PosClient, TransactionQuery};
use ledger_scheduler::{JobContext, JobProcessor, JobRecord, ProgressReporter};
use ledger_shared::time::extended_window;
use ledger_shared::{AppError, AppResult, GlRow, JournalSource, OverageRenderingVariant, StoreTotals};

/// `SignedCredit` is the chosen default rendering for the overage/shortage
/// plug (spec Open Question, account 70260): it keeps one column
/// ("Credit Amount") carrying the adjustment regardless of sign, matching
/// how the downstream accounting import maps a single column per account
/// rather than branching on sign. `SplitSign` stays fully implemented in
/// `ledger_gl::renderer` for the reconciliation tooling that expects it.
const OVERAGE_VARIANT: OverageRenderingVariant = OverageRenderingVariant::SignedCredit;

pub struct GlExportProcessor {
    pub pos_client: Arc<dyn PosClient>,
}

#[derive(serde::Deserialize)]
struct GlExportJobData {
    date: NaiveDate,
}

/// One store's fetch-aggregate step failing (bad timezone, POS network
/// error, ...) must not abort the whole export (spec §7): the rest of the
/// fleet still gets a journal, and the failure is reported back on the
/// job result rather than surfaced as a job-wide error.
async fn export_one_store(
    pos_client: &dyn PosClient,
    store: &ledger_shared::Store,
    report_date: NaiveDate,
) -> AppResult<(StoreTotals, Vec<GlRow>)> {
    let tz: chrono_tz::Tz = store
        .timezone
        .parse()
        .map_err(|_| AppError::validation(format!("unrecognized timezone '{}'", store.timezone)))?;
    let (from_utc, to_utc) = extended_window(report_date, tz);

    let transactions = pos_client
        .get_transactions(&store.pos_api_key, from_utc, to_utc, TransactionQuery::default())
        .await?;

    let totals = ledger_gl::aggregate(&transactions, report_date)?;
    let rows = render_rows(store, &totals, report_date, OVERAGE_VARIANT);
    Ok((totals, rows))
}

#[async_trait]
impl JobProcessor for GlExportProcessor {
    async fn process(
        &self,
        job: &JobRecord,
        ctx: &JobContext,
        progress: &dyn ProgressReporter,
    ) -> AppResult<serde_json::Value> {
        let data: GlExportJobData = serde_json::from_value(job.data.clone())
            .map_err(|e| AppError::validation(format!("gl-export job missing 'date': {e}")))?;

        let total = ctx.stores.len().max(1) as u8;
        let mut succeeded_stores = Vec::new();
        let mut failed_stores = Vec::new();
        let mut all_rows = Vec::new();
        let mut total_sales = rust_decimal::Decimal::ZERO;

        for (i, store) in ctx.stores.iter().enumerate() {
            match export_one_store(self.pos_client.as_ref(), store, data.date).await {
                Ok((totals, rows)) => {
                    total_sales += totals.gross_sales;
                    all_rows.extend(rows);
                    succeeded_stores.push(store.branch_code.clone());
                }
                Err(err) => {
                    tracing::warn!(store = %store.branch_code, error = %err.message, "gl-export failed for store");
                    failed_stores.push(serde_json::json!({ "store": store.branch_code, "error": err.message }));
                }
            }

            progress.report((((i + 1) as u8).saturating_mul(100)) / total);
        }

        let tsv = render_tsv(&all_rows, JournalSource::PosApi, data.date, chrono::Utc::now());
        let csv = render_csv(&all_rows);
        let (tsv_name, csv_name) = file_names(data.date, JournalSource::PosApi);

        let dir = std::path::Path::new(&ctx.exports_dir);
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::storage(format!("failed to create exports dir: {e}")))?;
        tokio::fs::write(dir.join(&tsv_name), tsv)
            .await
            .map_err(|e| AppError::storage(format!("failed to write {tsv_name}: {e}")))?;
        tokio::fs::write(dir.join(&csv_name), csv)
            .await
            .map_err(|e| AppError::storage(format!("failed to write {csv_name}: {e}")))?;

        // Per spec §7 "User-visible failure": the job itself always
        // completes (it is not retried for per-store failures) and
        // reports which stores succeeded.
        Ok(serde_json::json!({
            "success": failed_stores.is_empty(),
            "date": data.date,
            "stores": succeeded_stores,
            "totalSales": total_sales,
            "files": [tsv_name, csv_name],
            "failedStores": failed_stores,
        }))
    }
}
