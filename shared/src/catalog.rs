//! Catalog snapshot types.
//!
//! The catalog itself lives behind the `CatalogAccessor` collaborator; these
//! are the read-only shapes it returns. Prices here are *current* catalog
//! prices — once an order is validated its line prices are frozen and never
//! recomputed from a later snapshot.

use serde::{Deserialize, Serialize};

/// Point-in-time view of one product, as served to the pricing engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: String,
    pub name: String,
    /// Base unit price, overridden by a variant price when one is selected
    pub base_price: f64,
    pub is_available: bool,
    /// Available stock; `None` means the product is not stock-tracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(default)]
    pub variants: Vec<VariantSnapshot>,
    #[serde(default)]
    pub addons: Vec<AddonSnapshot>,
}

impl ProductSnapshot {
    pub fn variant(&self, variant_id: &str) -> Option<&VariantSnapshot> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    pub fn addon(&self, addon_id: &str) -> Option<&AddonSnapshot> {
        self.addons.iter().find(|a| a.id == addon_id)
    }
}

/// 规格（大小杯、份量等），选中后其价格覆盖基础价
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSnapshot {
    pub id: String,
    pub name: String,
    pub price: f64,
}

/// 加料项，每份有独立单价和数量上限
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonSnapshot {
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Maximum quantity of this add-on per line item
    pub max_quantity: u32,
}
