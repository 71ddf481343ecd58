//! ledger-cache-sync — the Cache Refresher (C7): keeps the Redis
//! inventory/discount view consistent with Postgres after each sync.

pub mod refresher;

pub use refresher::{CacheRefresher, DiscountRecord, InventoryRecord};
