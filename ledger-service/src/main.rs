//! ledger-service binary entry point (spec §2 "C10 Service Shell").
//!
//! Responsible for: loading `.env` and `Config`, initializing tracing,
//! constructing `AppState` (which also starts the Scheduler's cron
//! driver), wiring one worker per named queue to its processor, serving
//! the thin HTTP trigger/read surface (§6.4), and orchestrating graceful
//! shutdown on SIGINT/SIGTERM in the exact order spec §4.8 requires:
//! workers first, then queues, then Redis/Postgres handles.

mod api;
mod config;
mod jobs;
mod state;
mod store_registry_pg;

use std::sync::Arc;

use config::Config;
use ledger_pos_client::PosClient;
use ledger_scheduler::{JobProcessor, WorkerPool, QUEUE_DEFS};
use state::AppState;
use tokio::signal;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger_service=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(environment = %config.environment, "starting ledger-service");

    let state = AppState::new(&config).await?;

    let worker_pool = register_workers(&state);

    let app = api::create_router(state.clone())
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr, "ledger-service HTTP listening");

    let shutdown_requested = state.shutdown_requested.clone();
    let http_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                shutdown_requested.cancel();
            })
            .await
    });

    let serve_result = http_handle.await.map_err(BoxError::from).and_then(|r| r.map_err(BoxError::from));
    if let Err(e) = &serve_result {
        tracing::error!(error = %e, "HTTP server error");
    }

    // Graceful shutdown order (spec §4.8): workers first (each finishes
    // its in-flight job), then the scheduler's cron driver, then the
    // storage handles.
    let mut had_error = serve_result.is_err();

    if let Err(e) = worker_pool.shutdown().await {
        tracing::error!(error = %e, "worker pool failed to shut down cleanly");
        had_error = true;
    }

    if let Err(e) = state.shutdown_scheduler().await {
        tracing::error!(error = %e, "scheduler failed to shut down cleanly");
        had_error = true;
    }

    state.db.close().await;
    tracing::info!("ledger-service shut down");

    if had_error {
        std::process::exit(1);
    }
    Ok(())
}

/// Wire exactly one worker to each named queue's processor (spec §4.8
/// "Workers": each queue has exactly one worker").
fn register_workers(state: &AppState) -> WorkerPool {
    let mut pool = WorkerPool::new();

    for config in QUEUE_DEFS {
        let queue = state
            .queues
            .get(config.name)
            .expect("every QUEUE_DEFS entry has a matching queue instance")
            .clone();
        let processor = build_processor(config.name, state);
        pool.register(queue, processor, state.context.clone());
    }

    pool
}

fn build_processor(queue_name: &str, state: &AppState) -> Arc<dyn JobProcessor> {
    let pos_client: Arc<dyn PosClient> = state.pos_client.clone();
    match queue_name {
        "gl-export" => Arc::new(jobs::GlExportProcessor { pos_client }),
        "hourly-sales" => Arc::new(jobs::HourlySalesProcessor { pos_client }),
        "inventory-sync" => Arc::new(jobs::InventorySyncProcessor {
            pos_client,
            db: state.db.clone(),
            redis: state.redis.clone(),
        }),
        "banner-sync" => Arc::new(jobs::BannerSyncProcessor),
        "odoo-sync" => Arc::new(jobs::OdooSyncProcessor),
        other => unreachable!("unregistered queue in QUEUE_DEFS: {other}"),
    }
}

/// Fires on Ctrl+C or SIGTERM (spec §4.8 "On SIGINT/SIGTERM").
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
