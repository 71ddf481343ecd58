//! `hourly-sales` processor (spec §4.5, §6.1): fetch every store's
//! transactions for a date range (padded one day past the end per
//! `ledger_gl::hourly`'s contract), bucket by UTC hour, and write one
//! combined aggregated/detailed CSV+TSV quartet across all stores (each
//! row already carries its own Branch column).

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

use ledger_gl::{aggregate_hourly, default_range_end};
use ledger_pos_client::{PosClient, TransactionQuery};
use ledger_scheduler::{JobContext, JobProcessor, JobRecord, ProgressReporter};
use ledger_shared::time::local_day_window;
use ledger_shared::{AppError, AppResult};

pub struct HourlySalesProcessor {
    pub pos_client: Arc<dyn PosClient>,
}

#[derive(serde::Deserialize)]
struct HourlySalesJobData {
    start: NaiveDate,
    end: Option<NaiveDate>,
}

/// Append `rendered`'s body rows to `out`, writing the header only once.
fn append_dropping_repeated_header(out: &mut String, rendered: &str) {
    let mut lines = rendered.lines();
    let header = lines.next();
    if out.is_empty() {
        if let Some(h) = header {
            out.push_str(h);
            out.push('\n');
        }
    }
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
}

/// One store's fetch-aggregate step failing must not abort the whole
/// rollup (spec §7, same per-store isolation as `gl-export`).
async fn hourly_one_store(
    pos_client: &dyn PosClient,
    store: &ledger_shared::Store,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<ledger_gl::HourlyProfile> {
    let tz: chrono_tz::Tz = store
        .timezone
        .parse()
        .map_err(|_| AppError::validation(format!("unrecognized timezone '{}'", store.timezone)))?;

    let (from_utc, _) = local_day_window(start, tz);
    let (_, to_utc) = local_day_window(end + Duration::days(1), tz);

    let transactions = pos_client
        .get_transactions(&store.pos_api_key, from_utc, to_utc, TransactionQuery::default())
        .await?;

    aggregate_hourly(store, &transactions, start, end)
}

#[async_trait]
impl JobProcessor for HourlySalesProcessor {
    async fn process(
        &self,
        job: &JobRecord,
        ctx: &JobContext,
        progress: &dyn ProgressReporter,
    ) -> AppResult<serde_json::Value> {
        let data: HourlySalesJobData = serde_json::from_value(job.data.clone())
            .map_err(|e| AppError::validation(format!("hourly-sales job missing 'start': {e}")))?;
        let end = data.end.unwrap_or_else(|| default_range_end(data.start));

        let total = ctx.stores.len().max(1) as u8;
        let mut succeeded_stores = Vec::new();
        let mut failed_stores = Vec::new();
        let mut aggregated_csv = String::new();
        let mut aggregated_tsv = String::new();
        let mut detailed_csv = String::new();
        let mut detailed_tsv = String::new();

        for (i, store) in ctx.stores.iter().enumerate() {
            match hourly_one_store(self.pos_client.as_ref(), store, data.start, end).await {
                Ok(profile) => {
                    append_dropping_repeated_header(&mut aggregated_csv, &ledger_gl::hourly::render_aggregated(store, &profile, ','));
                    append_dropping_repeated_header(&mut aggregated_tsv, &ledger_gl::hourly::render_aggregated(store, &profile, '\t'));
                    append_dropping_repeated_header(&mut detailed_csv, &ledger_gl::hourly::render_detailed(store, &profile, ','));
                    append_dropping_repeated_header(&mut detailed_tsv, &ledger_gl::hourly::render_detailed(store, &profile, '\t'));
                    succeeded_stores.push(store.branch_code.clone());
                }
                Err(err) => {
                    tracing::warn!(store = %store.branch_code, error = %err.message, "hourly-sales failed for store");
                    failed_stores.push(serde_json::json!({ "store": store.branch_code, "error": err.message }));
                }
            }

            progress.report((((i + 1) as u8).saturating_mul(100)) / total);
        }

        let dir = std::path::Path::new(&ctx.exports_dir);
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::storage(format!("failed to create exports dir: {e}")))?;

        let agg_csv_name = format!("hourly_sales_aggregated_{}_to_{}.csv", data.start, end);
        let agg_tsv_name = format!("hourly_sales_aggregated_{}_to_{}.tsv", data.start, end);
        let det_csv_name = format!("hourly_sales_detailed_{}_to_{}.csv", data.start, end);
        let det_tsv_name = format!("hourly_sales_detailed_{}_to_{}.tsv", data.start, end);

        for (name, contents) in [
            (&agg_csv_name, &aggregated_csv),
            (&agg_tsv_name, &aggregated_tsv),
            (&det_csv_name, &detailed_csv),
            (&det_tsv_name, &detailed_tsv),
        ] {
            tokio::fs::write(dir.join(name), contents)
                .await
                .map_err(|e| AppError::storage(format!("failed to write {name}: {e}")))?;
        }

        Ok(serde_json::json!({
            "success": failed_stores.is_empty(),
            "start": data.start,
            "end": end,
            "stores": succeeded_stores,
            "files": [agg_csv_name, agg_tsv_name, det_csv_name, det_tsv_name],
            "failedStores": failed_stores,
        }))
    }
}
