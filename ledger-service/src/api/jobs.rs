//! Job trigger surface (spec §6.4): `addJob` / `getJobStatus`, the only
//! part of the scheduler the thin HTTP layer is allowed to see.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use ledger_scheduler::{JobOptions, QueueCounts};
use ledger_shared::{ApiResponse, AppError, AppResult};

use crate::state::AppState;

/// `{priority, attempts, backoff}` subset of job options accepted over
/// the trigger surface (spec §6.4).
#[derive(Debug, Deserialize, Default)]
pub struct AddJobOptions {
    #[serde(default)]
    pub priority: i32,
    pub attempts: Option<u32>,
    pub backoff_secs: Option<u64>,
}

impl From<AddJobOptions> for JobOptions {
    fn from(opts: AddJobOptions) -> Self {
        JobOptions {
            priority: opts.priority,
            attempts: opts.attempts,
            backoff_base: opts.backoff_secs.map(std::time::Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddJobRequest {
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub options: AddJobOptions,
}

/// `POST /api/jobs/:queue` — one-off enqueue. An unknown queue name
/// surfaces as a fatal `AppError`, never a per-store failure (spec §6.4).
pub async fn add_job(
    State(state): State<AppState>,
    Path(queue): Path<String>,
    Json(req): Json<AddJobRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let guard = state.scheduler.lock().await;
    let scheduler = guard
        .as_ref()
        .ok_or_else(|| AppError::internal("scheduler is shutting down"))?;
    let id = scheduler.add(&queue, req.data, req.options.into()).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({ "jobId": id }))))
}

/// `GET /api/jobs/status` — per-queue waiting/active/completed/failed
/// counts (spec §6.4 `getJobStatus`).
pub async fn job_status(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<HashMap<String, QueueCounts>>>> {
    let guard = state.scheduler.lock().await;
    let scheduler = guard
        .as_ref()
        .ok_or_else(|| AppError::internal("scheduler is shutting down"))?;
    let status = scheduler
        .job_status()
        .await
        .into_iter()
        .map(|(name, counts)| (name.to_string(), counts))
        .collect();
    Ok(Json(ApiResponse::success(status)))
}
