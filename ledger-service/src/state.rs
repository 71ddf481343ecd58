//! Shared application state (spec §4.10 "Configuration", §5 "In-process
//! mutable state is limited to the scheduler's worker handle table and
//! the worker-supplied context map").

use std::collections::HashMap;
use std::sync::Arc;

use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use ledger_pos_client::{NetworkPosClient, PosClient};
use ledger_scheduler::{JobContext, Queue, Scheduler, SharedContext, SharedQueue, QUEUE_DEFS};
use ledger_shared::StoreRegistry;

use crate::config::Config;
use crate::store_registry_pg::PgStoreRegistry;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: ConnectionManager,
    pub config: Config,
    pub store_registry: Arc<dyn StoreRegistry>,
    pub pos_client: Arc<dyn PosClient>,
    pub context: SharedContext,
    pub queues: HashMap<&'static str, SharedQueue>,
    /// `None` once `shutdown()` has taken it to stop the cron driver
    /// (spec §6.4 "idempotent").
    pub scheduler: Arc<Mutex<Option<Scheduler>>>,
    pub shutdown_requested: CancellationToken,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db = PgPool::connect(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;

        let store_registry: Arc<dyn StoreRegistry> = Arc::new(PgStoreRegistry::new(db.clone()));
        let pos_client: Arc<dyn PosClient> = Arc::new(NetworkPosClient::new(
            config.pos_base_url.clone(),
            config.pos_request_timeout_transactions,
            config.pos_request_timeout_other,
        )?);

        let stores = store_registry.active_stores().await?;
        let context = SharedContext::new(JobContext::new(stores, config.exports_dir.clone()));

        let queues: HashMap<&'static str, SharedQueue> =
            QUEUE_DEFS.iter().map(|c| (c.name, Arc::new(Queue::new(*c)))).collect();
        let mut scheduler = Scheduler::new(queues.clone()).await?;
        scheduler.register_repeatables().await?;
        scheduler.start().await?;

        Ok(Self {
            db,
            redis,
            config: config.clone(),
            store_registry,
            pos_client,
            context,
            queues,
            scheduler: Arc::new(Mutex::new(Some(scheduler))),
            shutdown_requested: CancellationToken::new(),
        })
    }

    /// Reload the store fleet and replace the shared job context wholesale
    /// (spec §5: never mutated in place).
    pub async fn refresh_context(&self) -> anyhow::Result<()> {
        let stores = self.store_registry.active_stores().await?;
        self.context.replace(JobContext::new(stores, self.config.exports_dir.clone()));
        Ok(())
    }

    /// Stop the cron driver. Safe to call more than once (spec §6.4).
    pub async fn shutdown_scheduler(&self) -> ledger_shared::AppResult<()> {
        let mut guard = self.scheduler.lock().await;
        if let Some(scheduler) = guard.take() {
            scheduler.shutdown().await?;
        }
        Ok(())
    }
}
