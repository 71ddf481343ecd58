//! Store Registry (C1)
//!
//! Loading store/tenant configuration from the upstream admin backend is
//! out of scope (spec §1); this module only specifies the interface
//! contract the rest of the pipeline depends on, plus an in-memory
//! implementation suitable for tests and for processes that are handed a
//! static store list at startup.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::model::Store;

/// Exposes the fleet of stores a job run should consider. Implementations
/// are free to refresh from any external source; the core pipeline only
/// ever sees the `Vec<Store>` snapshot returned by [`StoreRegistry::active_stores`].
#[async_trait]
pub trait StoreRegistry: Send + Sync {
    /// All stores with `is_active = true`.
    async fn active_stores(&self) -> AppResult<Vec<Store>>;

    /// A single store by id, if known and active.
    async fn find(&self, store_id: &str) -> AppResult<Option<Store>>;
}

/// Static, in-memory store list. The process that owns this registry is
/// responsible for populating it (e.g. from a config file or an admin-API
/// call performed once at startup, both outside this crate's concern).
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoreRegistry {
    stores: Vec<Store>,
}

impl InMemoryStoreRegistry {
    pub fn new(stores: Vec<Store>) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl StoreRegistry for InMemoryStoreRegistry {
    async fn active_stores(&self) -> AppResult<Vec<Store>> {
        Ok(self.stores.iter().filter(|s| s.is_active).cloned().collect())
    }

    async fn find(&self, store_id: &str) -> AppResult<Option<Store>> {
        Ok(self
            .stores
            .iter()
            .find(|s| s.id == store_id && s.is_active)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(id: &str, active: bool) -> Store {
        Store {
            id: id.into(),
            name: format!("Store {id}"),
            branch_code: format!("BR-{id}"),
            timezone: "America/New_York".into(),
            pos_api_key: "key".into(),
            is_active: active,
        }
    }

    #[tokio::test]
    async fn active_stores_filters_inactive() {
        let registry = InMemoryStoreRegistry::new(vec![store("1", true), store("2", false)]);
        let active = registry.active_stores().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "1");
    }

    #[tokio::test]
    async fn find_returns_none_for_inactive_store() {
        let registry = InMemoryStoreRegistry::new(vec![store("2", false)]);
        assert!(registry.find("2").await.unwrap().is_none());
    }
}
