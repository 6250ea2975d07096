//! Order storage boundary.
//!
//! Persistence itself is an external collaborator; the engine talks to this
//! trait. Updates are version-checked so a storage backend shared between
//! processes still serializes the read-modify-append sequence per order —
//! the in-process per-order lock makes conflicts rare, the version check
//! makes them impossible to miss.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use shared::order::Order;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Stale version for order {0}: expected {1}")]
    StaleVersion(Uuid, u64),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order together with its items and first history entry,
    /// as one unit.
    async fn insert(&self, order: Order) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Order, StoreError>;

    /// Replace the stored order if its version still equals
    /// `expected_version`, otherwise fail with [`StoreError::StaleVersion`].
    async fn update(&self, order: &Order, expected_version: u64) -> Result<(), StoreError>;

    /// Non-terminal orders for one store.
    async fn list_active_for_store(&self, store_id: &str) -> Result<Vec<Order>, StoreError>;
}

/// In-process order store used by the server runtime and tests.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<Uuid, Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<(), StoreError> {
        self.orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Order, StoreError> {
        self.orders
            .get(&id)
            .map(|o| o.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, order: &Order, expected_version: u64) -> Result<(), StoreError> {
        let mut existing = self
            .orders
            .get_mut(&order.id)
            .ok_or(StoreError::NotFound(order.id))?;
        if existing.version != expected_version {
            return Err(StoreError::StaleVersion(order.id, expected_version));
        }
        *existing = order.clone();
        Ok(())
    }

    async fn list_active_for_store(&self, store_id: &str) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.store_id == store_id && !o.status.is_terminal())
            .map(|o| o.clone())
            .collect())
    }
}
