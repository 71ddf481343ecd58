//! `inventory-sync` processor (spec §4.6-§4.8): pull inventory and
//! discount rows from the POS vendor for every active store, upsert them
//! into Postgres (`INSERT … ON CONFLICT … DO UPDATE`, row-level, no
//! cross-row transaction per spec §8), then run the Cache Refresher (C7)
//! to bring the Redis view back in sync.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use ledger_cache_sync::CacheRefresher;
use ledger_pos_client::PosClient;
use ledger_scheduler::{JobContext, JobProcessor, JobRecord, ProgressReporter};
use ledger_shared::{AppError, AppResult, ErrorCode};

pub struct InventorySyncProcessor {
    pub pos_client: Arc<dyn PosClient>,
    pub db: PgPool,
    pub redis: redis::aio::ConnectionManager,
}

#[derive(Deserialize)]
struct PosInventoryRow {
    product_id: String,
    #[serde(default)]
    quantity_on_hand: Decimal,
    #[serde(default)]
    unit_cost: Decimal,
}

#[derive(Deserialize)]
struct PosDiscountRow {
    discount_id: String,
    name: String,
    #[serde(default = "default_true")]
    is_active: bool,
}

fn default_true() -> bool {
    true
}

async fn upsert_inventory(db: &PgPool, location_id: &str, row: &PosInventoryRow) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO inventory (location_id, product_id, quantity_on_hand, unit_cost, synced_at)
         VALUES ($1, $2, $3, $4, now())
         ON CONFLICT (location_id, product_id)
         DO UPDATE SET quantity_on_hand = EXCLUDED.quantity_on_hand, unit_cost = EXCLUDED.unit_cost, synced_at = now()",
    )
    .bind(location_id)
    .bind(&row.product_id)
    .bind(row.quantity_on_hand)
    .bind(row.unit_cost)
    .execute(db)
    .await
    .map_err(|e| AppError::with_message(ErrorCode::DatabaseError, e.to_string()))?;
    Ok(())
}

async fn upsert_discount(db: &PgPool, location_id: &str, row: &PosDiscountRow) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO discounts (location_id, discount_id, name, is_active, synced_at)
         VALUES ($1, $2, $3, $4, now())
         ON CONFLICT (location_id, discount_id)
         DO UPDATE SET name = EXCLUDED.name, is_active = EXCLUDED.is_active, synced_at = now()",
    )
    .bind(location_id)
    .bind(&row.discount_id)
    .bind(&row.name)
    .bind(row.is_active)
    .execute(db)
    .await
    .map_err(|e| AppError::with_message(ErrorCode::DatabaseError, e.to_string()))?;
    Ok(())
}

#[async_trait]
impl JobProcessor for InventorySyncProcessor {
    async fn process(
        &self,
        _job: &JobRecord,
        ctx: &JobContext,
        progress: &dyn ProgressReporter,
    ) -> AppResult<serde_json::Value> {
        let refresher = CacheRefresher::new(self.db.clone(), self.redis.clone());
        let total = ctx.stores.len().max(1) as u8;
        let mut location_ids = Vec::new();

        for (i, store) in ctx.stores.iter().enumerate() {
            let inventory_rows = self.pos_client.get_inventory_report(&store.pos_api_key).await?;
            for raw in &inventory_rows {
                match serde_json::from_value::<PosInventoryRow>(raw.clone()) {
                    Ok(row) => upsert_inventory(&self.db, &store.id, &row).await?,
                    Err(e) => tracing::warn!(store = %store.id, error = %e, "skipping unparseable inventory row"),
                }
            }

            let discount_rows = self.pos_client.get_discounts_v2(&store.pos_api_key).await?;
            for raw in &discount_rows {
                match serde_json::from_value::<PosDiscountRow>(raw.clone()) {
                    Ok(row) => upsert_discount(&self.db, &store.id, &row).await?,
                    Err(e) => tracing::warn!(store = %store.id, error = %e, "skipping unparseable discount row"),
                }
            }

            location_ids.push(store.id.clone());
            progress.report((((i + 1) as u8).saturating_mul(50)) / total);
        }

        let refresh_results = refresher.refresh_all(&location_ids).await;
        let failed: Vec<&str> = refresh_results
            .iter()
            .filter_map(|(id, result)| result.as_ref().err().map(|_| id.as_str()))
            .collect();
        progress.report(100);

        Ok(serde_json::json!({
            "locations_synced": location_ids.len(),
            "cache_refresh_failures": failed,
        }))
    }
}
