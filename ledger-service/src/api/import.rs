//! CSV/JSON/POST tabular ingestion endpoint (spec §4.4, §6.5): accepts an
//! externally produced export, rolls it up per store through the same
//! renderer the POS-driven `gl-export` job uses, and writes the
//! `_csv`/`_json`/`_post` suffixed journal files (spec §6.3).

use std::collections::{BTreeMap, HashMap};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;

use ledger_gl::import::{parse_csv, parse_json, resolve_store_alias, rollup, ImportRow};
use ledger_gl::renderer::{file_names, render_csv, render_rows, render_tsv};
use ledger_shared::{ApiResponse, AppError, AppResult, JournalSource, OverageRenderingVariant, Store};

use crate::state::AppState;

const OVERAGE_VARIANT: OverageRenderingVariant = OverageRenderingVariant::SignedCredit;

/// `BTreeMap`, not `HashMap`: the combined rendered journal's per-store
/// row blocks must appear in the same order across runs of the same
/// input (spec P2, I7) — a `HashMap`'s randomly seeded iteration order
/// would make that order vary process to process.
fn group_by_store<'a>(
    rows: &'a [ImportRow],
    aliases: &HashMap<String, String>,
) -> BTreeMap<String, Vec<&'a ImportRow>> {
    let mut groups: BTreeMap<String, Vec<&ImportRow>> = BTreeMap::new();
    for row in rows {
        let (resolved, fell_back) = resolve_store_alias(aliases, &row.location);
        if fell_back {
            tracing::warn!(dashboard_name = %row.location, "no alias mapping for imported location, using raw name");
        }
        groups.entry(resolved).or_default().push(row);
    }
    groups
}

fn find_store<'a>(stores: &'a [Store], resolved_name: &str) -> Option<&'a Store> {
    stores
        .iter()
        .find(|s| s.name == resolved_name || s.branch_code == resolved_name)
}

fn parse_report_date(rows: &[ImportRow], explicit: Option<NaiveDate>) -> AppResult<NaiveDate> {
    if let Some(date) = explicit {
        return Ok(date);
    }
    rows.first()
        .and_then(|r| r.date.split_whitespace().next())
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(|| AppError::validation("could not determine report date from import rows"))
}

/// `POST /api/gl-journal/import` (spec §6.5). Dispatches on `Content-Type`:
/// `text/csv` for the CSV path, `application/json` for the bare-array or
/// `{date?, data}` envelope form.
pub async fn import_gl_journal(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let (rows, source, explicit_date) = if content_type.starts_with("text/csv") {
        (parse_csv(&body)?, JournalSource::Csv, None)
    } else if content_type.starts_with("application/json") {
        let explicit_date = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("date").and_then(|d| d.as_str().map(str::to_string)))
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok());
        (parse_json(&body)?, JournalSource::Json, explicit_date)
    } else {
        return Err(AppError::validation(format!(
            "unsupported content type '{content_type}' for GL journal import"
        )));
    };

    if rows.is_empty() {
        return Err(AppError::validation("import body contained no rows"));
    }

    let report_date = parse_report_date(&rows, explicit_date)?;
    let context = state.context.load();
    let groups = group_by_store(&rows, &state.config.store_aliases);

    let mut all_rows = Vec::new();
    let mut unmatched_stores = Vec::new();
    for (resolved_name, store_rows) in &groups {
        let Some(store) = find_store(&context.stores, resolved_name) else {
            unmatched_stores.push(resolved_name.clone());
            continue;
        };
        let owned_rows: Vec<ImportRow> = store_rows
            .iter()
            .map(|r| ImportRow {
                date: r.date.clone(),
                location: r.location.clone(),
                total_price: r.total_price,
                discount_amount: r.discount_amount,
                loyalty: r.loyalty,
                tax: r.tax,
                debit: r.debit,
                cash: r.cash,
                electronic: r.electronic,
                cost: r.cost,
            })
            .collect();
        let totals = rollup(&owned_rows);
        all_rows.extend(render_rows(store, &totals, report_date, OVERAGE_VARIANT));
    }

    if all_rows.is_empty() {
        return Err(AppError::validation(
            "no imported rows matched a known store after alias resolution",
        ));
    }

    let tsv = render_tsv(&all_rows, source, report_date, chrono::Utc::now());
    let csv = render_csv(&all_rows);
    let (tsv_name, csv_name) = file_names(report_date, source);

    let dir = std::path::Path::new(&context.exports_dir);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::storage(format!("failed to create exports dir: {e}")))?;
    tokio::fs::write(dir.join(&tsv_name), tsv)
        .await
        .map_err(|e| AppError::storage(format!("failed to write {tsv_name}: {e}")))?;
    tokio::fs::write(dir.join(&csv_name), csv)
        .await
        .map_err(|e| AppError::storage(format!("failed to write {csv_name}: {e}")))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "date": report_date,
        "rows": all_rows.len(),
        "unmatchedStores": unmatched_stores,
        "files": [tsv_name, csv_name],
    }))))
}

