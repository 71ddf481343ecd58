//! Postgres-backed [`StoreRegistry`]
//!
//! Tenant/store configuration loading from the upstream admin backend is
//! out of scope (spec §1); this is the minimal concrete implementation a
//! running process needs, reading the store table this service's own
//! Postgres database owns rather than calling out to the admin API.

use async_trait::async_trait;
use sqlx::PgPool;

use ledger_shared::{AppError, AppResult, Store, StoreRegistry};

pub struct PgStoreRegistry {
    pool: PgPool,
}

impl PgStoreRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: String,
    name: String,
    branch_code: String,
    timezone: String,
    pos_api_key: String,
    is_active: bool,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Store {
            id: row.id,
            name: row.name,
            branch_code: row.branch_code,
            timezone: row.timezone,
            pos_api_key: row.pos_api_key,
            is_active: row.is_active,
        }
    }
}

#[async_trait]
impl StoreRegistry for PgStoreRegistry {
    async fn active_stores(&self) -> AppResult<Vec<Store>> {
        let rows: Vec<StoreRow> = sqlx::query_as(
            "SELECT id, name, branch_code, timezone, pos_api_key, is_active FROM stores WHERE is_active = true",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_message(ledger_shared::ErrorCode::DatabaseError, e.to_string()))?;
        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn find(&self, store_id: &str) -> AppResult<Option<Store>> {
        let row: Option<StoreRow> = sqlx::query_as(
            "SELECT id, name, branch_code, timezone, pos_api_key, is_active FROM stores WHERE id = $1 AND is_active = true",
        )
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_message(ledger_shared::ErrorCode::DatabaseError, e.to_string()))?;
        Ok(row.map(Store::from))
    }
}
