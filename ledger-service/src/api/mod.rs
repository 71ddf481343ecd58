//! The thin HTTP trigger/read surface (spec §1, §6.4): everything else —
//! auth, the Bull-board style dashboard, Odoo write-back — is an explicit
//! non-goal and lives outside this crate.

pub mod health;
pub mod import;
pub mod jobs;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/jobs/status", get(jobs::job_status))
        .route("/api/jobs/{queue}", post(jobs::add_job))
        .route("/api/gl-journal/import", post(import::import_gl_journal))
        .with_state(state)
}
