//! Catalog Snapshot Accessor — external collaborator boundary.
//!
//! The catalog is owned elsewhere; the engine only ever reads point-in-time
//! snapshots through [`CatalogAccessor`]. Lookups are treated as potentially
//! blocking I/O and are bounded by a timeout at the call site (see the
//! pricing engine).

use async_trait::async_trait;
use dashmap::DashMap;

use shared::catalog::ProductSnapshot;

/// Catalog lookup errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the current catalog state, plus an optional conditional
/// stock decrement used to close the check-then-create oversell race.
///
/// Backends that cannot decrement atomically keep the default no-op
/// implementations, which restores plain check-only stock behavior.
#[async_trait]
pub trait CatalogAccessor: Send + Sync {
    /// Point-in-time snapshot of one product for one store.
    async fn lookup(
        &self,
        store_id: &str,
        product_id: &str,
    ) -> Result<ProductSnapshot, CatalogError>;

    /// Conditionally take `quantity` units of stock. Returns `false` when
    /// the remaining stock is insufficient; non-stock-tracked products
    /// always succeed.
    async fn try_decrement_stock(
        &self,
        _store_id: &str,
        _product_id: &str,
        _quantity: u32,
    ) -> Result<bool, CatalogError> {
        Ok(true)
    }

    /// Return previously taken stock (creation aborted after a partial take).
    async fn restore_stock(
        &self,
        _store_id: &str,
        _product_id: &str,
        _quantity: u32,
    ) -> Result<(), CatalogError> {
        Ok(())
    }
}

/// In-process catalog used by the server runtime and tests.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: DashMap<String, ProductSnapshot>,
}

fn product_key(store_id: &str, product_id: &str) -> String {
    format!("{}:{}", store_id, product_id)
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, store_id: &str, product: ProductSnapshot) {
        self.products
            .insert(product_key(store_id, &product.product_id), product);
    }

    pub fn remaining_stock(&self, store_id: &str, product_id: &str) -> Option<i32> {
        self.products
            .get(&product_key(store_id, product_id))
            .and_then(|p| p.stock)
    }
}

#[async_trait]
impl CatalogAccessor for InMemoryCatalog {
    async fn lookup(
        &self,
        store_id: &str,
        product_id: &str,
    ) -> Result<ProductSnapshot, CatalogError> {
        self.products
            .get(&product_key(store_id, product_id))
            .map(|p| p.clone())
            .ok_or_else(|| CatalogError::NotFound(product_id.to_string()))
    }

    async fn try_decrement_stock(
        &self,
        store_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<bool, CatalogError> {
        let mut product = self
            .products
            .get_mut(&product_key(store_id, product_id))
            .ok_or_else(|| CatalogError::NotFound(product_id.to_string()))?;

        match product.stock.as_mut() {
            // Not stock-tracked
            None => Ok(true),
            Some(stock) if *stock >= quantity as i32 => {
                *stock -= quantity as i32;
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }

    async fn restore_stock(
        &self,
        store_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), CatalogError> {
        if let Some(mut product) = self.products.get_mut(&product_key(store_id, product_id))
            && let Some(stock) = product.stock.as_mut()
        {
            *stock += quantity as i32;
        }
        Ok(())
    }
}
