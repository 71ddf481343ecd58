//! Health check endpoint (not part of spec §6.4 proper, but the minimal
//! liveness probe every axum-fronted service in this stack exposes).

use axum::Json;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ledger-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
