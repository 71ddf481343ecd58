//! Cache Refresher (C7)
//!
//! Reads per-location inventory and discounts from Postgres and overwrites
//! the Redis view atomically per location (spec §4.7, §6.2). A failure on
//! one location must not affect any other; callers fan this out across a
//! fleet of locations and collect per-location failures rather than
//! aborting the whole sync.

use redis::AsyncCommands;
use serde::Serialize;
use sqlx::PgPool;

use ledger_shared::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryRecord {
    pub location_id: String,
    pub product_id: String,
    pub quantity_on_hand: rust_decimal::Decimal,
    pub unit_cost: rust_decimal::Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DiscountRecord {
    pub location_id: String,
    pub discount_id: String,
    pub name: String,
    pub is_active: bool,
}

pub struct CacheRefresher {
    db: PgPool,
    redis: redis::aio::ConnectionManager,
}

impl CacheRefresher {
    pub fn new(db: PgPool, redis: redis::aio::ConnectionManager) -> Self {
        Self { db, redis }
    }

    async fn fetch_inventory(&self, location_id: &str) -> AppResult<Vec<InventoryRecord>> {
        sqlx::query_as::<_, InventoryRecord>(
            "SELECT location_id, product_id, quantity_on_hand, unit_cost FROM inventory WHERE location_id = $1",
        )
        .bind(location_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::with_message(ledger_shared::ErrorCode::DatabaseError, e.to_string()))
    }

    async fn fetch_discounts(&self, location_id: &str) -> AppResult<Vec<DiscountRecord>> {
        sqlx::query_as::<_, DiscountRecord>(
            "SELECT location_id, discount_id, name, is_active FROM discounts WHERE location_id = $1",
        )
        .bind(location_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::with_message(ledger_shared::ErrorCode::DatabaseError, e.to_string()))
    }

    /// Refresh the Redis view for a single location: `inventory:{id}`,
    /// `discounts:{id}`, and `sync:{id}:timestamp` (spec §6.2). No TTL —
    /// entries are simply overwritten on the next sync.
    pub async fn refresh_location(&self, location_id: &str) -> AppResult<()> {
        let inventory = self.fetch_inventory(location_id).await?;
        let discounts = self.fetch_discounts(location_id).await?;

        let inventory_json = serde_json::to_string(&inventory)
            .map_err(|e| AppError::internal(format!("failed to serialize inventory: {e}")))?;
        let discounts_json = serde_json::to_string(&discounts)
            .map_err(|e| AppError::internal(format!("failed to serialize discounts: {e}")))?;
        let timestamp_ms = chrono::Utc::now().timestamp_millis().to_string();

        let mut conn = self.redis.clone();
        conn.set::<_, _, ()>(format!("inventory:{location_id}"), inventory_json)
            .await
            .map_err(|e| AppError::with_message(ledger_shared::ErrorCode::CacheError, e.to_string()))?;
        conn.set::<_, _, ()>(format!("discounts:{location_id}"), discounts_json)
            .await
            .map_err(|e| AppError::with_message(ledger_shared::ErrorCode::CacheError, e.to_string()))?;
        conn.set::<_, _, ()>(format!("sync:{location_id}:timestamp"), timestamp_ms)
            .await
            .map_err(|e| AppError::with_message(ledger_shared::ErrorCode::CacheError, e.to_string()))?;

        Ok(())
    }

    /// Refresh every location in `location_ids`, isolating failures: one
    /// location's error is recorded and the rest proceed (spec §4.7).
    pub async fn refresh_all(&self, location_ids: &[String]) -> Vec<(String, AppResult<()>)> {
        let mut results = Vec::with_capacity(location_ids.len());
        for location_id in location_ids {
            let result = self.refresh_location(location_id).await;
            if let Err(ref err) = result {
                tracing::warn!(location_id, error = %err.message, "cache refresh failed for location");
            }
            results.push((location_id.clone(), result));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn inventory_record_serializes_to_json() {
        let record = InventoryRecord {
            location_id: "loc-1".into(),
            product_id: "sku-1".into(),
            quantity_on_hand: dec!(10),
            unit_cost: dec!(4.25),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"location_id\":\"loc-1\""));
        assert!(json.contains("\"unit_cost\":\"4.25\""));
    }

    #[test]
    fn discount_record_serializes_to_json() {
        let record = DiscountRecord {
            location_id: "loc-1".into(),
            discount_id: "d-1".into(),
            name: "Spring Sale".into(),
            is_active: true,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"is_active\":true"));
    }
}
