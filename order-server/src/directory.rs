//! Store directory — which tenant owns which store.
//!
//! Tenant resolution happens upstream; the engine only needs the ownership
//! relation to authorize store-room joins and order operations.

use dashmap::DashMap;

pub trait StoreDirectory: Send + Sync {
    /// Tenant that owns `store_id`, or `None` for an unknown store.
    fn tenant_of(&self, store_id: &str) -> Option<String>;
}

/// In-process directory used by the server runtime and tests.
#[derive(Debug, Default)]
pub struct InMemoryStoreDirectory {
    stores: DashMap<String, String>,
}

impl InMemoryStoreDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, store_id: impl Into<String>, tenant_id: impl Into<String>) {
        self.stores.insert(store_id.into(), tenant_id.into());
    }
}

impl StoreDirectory for InMemoryStoreDirectory {
    fn tenant_of(&self, store_id: &str) -> Option<String> {
        self.stores.get(store_id).map(|t| t.clone())
    }
}
