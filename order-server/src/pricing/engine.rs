//! Order validation and pricing.
//!
//! # Validation flow
//!
//! ```text
//! validate(store_id, items, coupon_code)
//!     ├─ 1. Per line: catalog lookup (bounded by timeout)
//!     │      ├─ product missing/unavailable  → PRODUCT_UNAVAILABLE
//!     │      ├─ unknown variant              → INVALID_VARIANT
//!     │      ├─ unknown add-on               → INVALID_ADDON
//!     │      ├─ add-on over configured max   → ADDON_LIMIT_EXCEEDED
//!     │      └─ stock below quantity         → INSUFFICIENT_STOCK
//!     ├─ 2. Freeze line prices: unit = (variant|base) + Σ(addon × qty)
//!     ├─ 3. gross = Σ line totals
//!     ├─ 4. Coupon checks + discount (capped at max, then at gross)
//!     └─ 5. net = gross − discount, prep-time estimate
//! ```
//!
//! Stock is checked, not reserved — the conditional decrement at creation
//! time closes the oversell race (see the order service).

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::timeout;
use tracing::debug;

use shared::catalog::ProductSnapshot;
use shared::order::{AddonSelection, OrderItem, Rejection, RejectionCode};

use crate::catalog::{CatalogAccessor, CatalogError};
use crate::coupons::{discount_for, CouponStore};

use super::money::{to_decimal, to_f64};

/// Fixed base of the preparation estimate, minutes
const ESTIMATE_BASE_MINUTES: u32 = 10;
/// Extra minutes per unit of quantity beyond the first, per line
const ESTIMATE_PER_EXTRA_UNIT: u32 = 2;
/// Extra minutes per line carrying at least one add-on
const ESTIMATE_PER_ADDON_LINE: u32 = 3;

/// Requested add-on on one line
#[derive(Debug, Clone)]
pub struct AddonInput {
    pub addon_id: String,
    pub quantity: u32,
}

/// One requested line, before validation
#[derive(Debug, Clone)]
pub struct LineItemInput {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: u32,
    pub addons: Vec<AddonInput>,
    pub note: Option<String>,
}

/// A validated, fully priced order draft. No persistent effect has occurred.
#[derive(Debug, Clone)]
pub struct PricedOrder {
    pub items: Vec<OrderItem>,
    pub gross_amount: f64,
    pub discount_amount: f64,
    pub net_amount: f64,
    pub estimated_minutes: u32,
}

/// Pricing & Validation Engine — pure computation over inputs plus one read
/// of external catalog state.
pub struct PricingEngine {
    catalog: Arc<dyn CatalogAccessor>,
    coupons: Arc<CouponStore>,
    lookup_timeout: Duration,
}

impl PricingEngine {
    pub fn new(
        catalog: Arc<dyn CatalogAccessor>,
        coupons: Arc<CouponStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            coupons,
            lookup_timeout,
        }
    }

    /// Validate and price a raw item list against the current catalog.
    pub async fn validate(
        &self,
        store_id: &str,
        items: &[LineItemInput],
        coupon_code: Option<&str>,
    ) -> Result<PricedOrder, Rejection> {
        let mut priced_items = Vec::with_capacity(items.len());
        let mut gross = Decimal::ZERO;

        for line in items {
            let product = self.lookup(store_id, &line.product_id).await?;
            let item = price_line(&product, line)?;
            gross += to_decimal(item.line_total);
            priced_items.push(item);
        }

        let gross = to_f64(gross);

        let discount = match coupon_code {
            Some(code) => {
                let coupon = self.coupons.get(store_id, code).ok_or_else(|| {
                    Rejection::new(
                        RejectionCode::CouponInvalid,
                        format!("Unknown coupon code {}", code),
                    )
                })?;
                discount_for(&coupon, gross, chrono::Utc::now())?
            }
            None => 0.0,
        };

        let net = to_f64(to_decimal(gross) - to_decimal(discount));
        let estimated_minutes = estimate_minutes(&priced_items);

        debug!(
            store_id,
            lines = priced_items.len(),
            gross,
            discount,
            net,
            estimated_minutes,
            "Order draft priced"
        );

        Ok(PricedOrder {
            items: priced_items,
            gross_amount: gross,
            discount_amount: discount,
            net_amount: net,
            estimated_minutes,
        })
    }

    async fn lookup(&self, store_id: &str, product_id: &str) -> Result<ProductSnapshot, Rejection> {
        match timeout(
            self.lookup_timeout,
            self.catalog.lookup(store_id, product_id),
        )
        .await
        {
            Err(_) => Err(Rejection::new(
                RejectionCode::ValidationTimeout,
                format!("Catalog lookup for {} timed out", product_id),
            )),
            Ok(Err(CatalogError::NotFound(_))) => Err(Rejection::new(
                RejectionCode::ProductUnavailable,
                format!("Product {} not found", product_id),
            )),
            Ok(Err(CatalogError::Unavailable(msg))) => {
                Err(Rejection::new(RejectionCode::InternalError, msg))
            }
            Ok(Ok(product)) => Ok(product),
        }
    }
}

/// Price a single line against its product snapshot. Prices are frozen here
/// and never recomputed from a later catalog state.
fn price_line(product: &ProductSnapshot, line: &LineItemInput) -> Result<OrderItem, Rejection> {
    if !product.is_available {
        return Err(Rejection::new(
            RejectionCode::ProductUnavailable,
            format!("Product {} is currently unavailable", product.product_id),
        ));
    }

    let (mut unit_price, name) = match &line.variant_id {
        Some(variant_id) => {
            let variant = product.variant(variant_id).ok_or_else(|| {
                Rejection::new(
                    RejectionCode::InvalidVariant,
                    format!(
                        "Variant {} does not belong to product {}",
                        variant_id, product.product_id
                    ),
                )
            })?;
            (
                to_decimal(variant.price),
                format!("{} ({})", product.name, variant.name),
            )
        }
        None => (to_decimal(product.base_price), product.name.clone()),
    };

    let mut addons = Vec::new();
    for requested in &line.addons {
        let addon = product.addon(&requested.addon_id).ok_or_else(|| {
            Rejection::new(
                RejectionCode::InvalidAddon,
                format!(
                    "Add-on {} does not belong to product {}",
                    requested.addon_id, product.product_id
                ),
            )
        })?;
        if requested.quantity > addon.max_quantity {
            return Err(Rejection::new(
                RejectionCode::AddonLimitExceeded,
                format!(
                    "Add-on {} quantity {} exceeds the maximum {}",
                    addon.name, requested.quantity, addon.max_quantity
                ),
            ));
        }
        if requested.quantity == 0 {
            continue;
        }
        unit_price += to_decimal(addon.price) * Decimal::from(requested.quantity);
        addons.push(AddonSelection {
            addon_id: addon.id.clone(),
            name: addon.name.clone(),
            unit_price: addon.price,
            quantity: requested.quantity,
        });
    }

    if let Some(stock) = product.stock
        && stock < line.quantity as i32
    {
        return Err(Rejection::new(
            RejectionCode::InsufficientStock,
            format!(
                "Product {} has {} in stock, {} requested",
                product.product_id, stock, line.quantity
            ),
        ));
    }

    let line_total = unit_price * Decimal::from(line.quantity);

    Ok(OrderItem {
        product_id: product.product_id.clone(),
        variant_id: line.variant_id.clone(),
        name,
        quantity: line.quantity,
        unit_price: to_f64(unit_price),
        line_total: to_f64(line_total),
        addons,
        note: line.note.clone(),
    })
}

/// Display-only preparation estimate: a fixed base, plus 2 minutes per unit
/// of quantity beyond the first, plus 3 minutes per line with add-ons.
fn estimate_minutes(items: &[OrderItem]) -> u32 {
    let extra_units: u32 = items.iter().map(|i| i.quantity.saturating_sub(1)).sum();
    let addon_lines = items.iter().filter(|i| !i.addons.is_empty()).count() as u32;
    ESTIMATE_BASE_MINUTES + ESTIMATE_PER_EXTRA_UNIT * extra_units + ESTIMATE_PER_ADDON_LINE * addon_lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use chrono::{Duration as ChronoDuration, Utc};
    use shared::catalog::{AddonSnapshot, VariantSnapshot};
    use shared::coupon::{Coupon, DiscountRule};

    fn catalog_with_product() -> Arc<InMemoryCatalog> {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.upsert(
            "s1",
            ProductSnapshot {
                product_id: "noodles".to_string(),
                name: "Dan Dan Noodles".to_string(),
                base_price: 60.0,
                is_available: true,
                stock: Some(10),
                variants: vec![VariantSnapshot {
                    id: "large".to_string(),
                    name: "Large".to_string(),
                    price: 75.0,
                }],
                addons: vec![AddonSnapshot {
                    id: "egg".to_string(),
                    name: "Extra Egg".to_string(),
                    price: 5.0,
                    max_quantity: 2,
                }],
            },
        );
        catalog
    }

    fn engine(catalog: Arc<InMemoryCatalog>, coupons: Arc<CouponStore>) -> PricingEngine {
        PricingEngine::new(catalog, coupons, Duration::from_millis(500))
    }

    fn line(quantity: u32) -> LineItemInput {
        LineItemInput {
            product_id: "noodles".to_string(),
            variant_id: None,
            quantity,
            addons: vec![],
            note: None,
        }
    }

    fn ten_percent_coupon() -> Coupon {
        let now = Utc::now();
        Coupon {
            code: "TEN".to_string(),
            store_id: "s1".to_string(),
            rule: DiscountRule::Percentage { percent: 10.0 },
            min_order_amount: None,
            max_discount: None,
            valid_from: now - ChronoDuration::days(1),
            valid_until: now + ChronoDuration::days(1),
            is_active: true,
            used_count: 0,
            usage_limit: None,
        }
    }

    #[tokio::test]
    async fn test_spec_example_pricing() {
        // items = [{product, qty 2, unit 60}], 10%-off ⇒ gross 120, discount 12, net 108
        let coupons = Arc::new(CouponStore::new());
        coupons.upsert(ten_percent_coupon());
        let engine = engine(catalog_with_product(), coupons);

        let priced = engine
            .validate("s1", &[line(2)], Some("TEN"))
            .await
            .unwrap();

        assert_eq!(priced.gross_amount, 120.0);
        assert_eq!(priced.discount_amount, 12.0);
        assert_eq!(priced.net_amount, 108.0);
        assert_eq!(priced.items[0].unit_price, 60.0);
        assert_eq!(priced.items[0].line_total, 120.0);
    }

    #[tokio::test]
    async fn test_variant_overrides_base_price() {
        let engine = engine(catalog_with_product(), Arc::new(CouponStore::new()));
        let mut input = line(1);
        input.variant_id = Some("large".to_string());

        let priced = engine.validate("s1", &[input], None).await.unwrap();
        assert_eq!(priced.items[0].unit_price, 75.0);
        assert!(priced.items[0].name.contains("Large"));
    }

    #[tokio::test]
    async fn test_unknown_variant_rejected() {
        let engine = engine(catalog_with_product(), Arc::new(CouponStore::new()));
        let mut input = line(1);
        input.variant_id = Some("mega".to_string());

        let err = engine.validate("s1", &[input], None).await.unwrap_err();
        assert_eq!(err.code, RejectionCode::InvalidVariant);
    }

    #[tokio::test]
    async fn test_addon_pricing_and_limits() {
        let engine = engine(catalog_with_product(), Arc::new(CouponStore::new()));
        let mut input = line(1);
        input.addons = vec![AddonInput {
            addon_id: "egg".to_string(),
            quantity: 2,
        }];

        // unit = 60 + 5×2 = 70
        let priced = engine.validate("s1", &[input.clone()], None).await.unwrap();
        assert_eq!(priced.items[0].unit_price, 70.0);

        input.addons[0].quantity = 3;
        let err = engine.validate("s1", &[input], None).await.unwrap_err();
        assert_eq!(err.code, RejectionCode::AddonLimitExceeded);
    }

    #[tokio::test]
    async fn test_unknown_addon_rejected() {
        let engine = engine(catalog_with_product(), Arc::new(CouponStore::new()));
        let mut input = line(1);
        input.addons = vec![AddonInput {
            addon_id: "truffle".to_string(),
            quantity: 1,
        }];

        let err = engine.validate("s1", &[input], None).await.unwrap_err();
        assert_eq!(err.code, RejectionCode::InvalidAddon);
    }

    #[tokio::test]
    async fn test_insufficient_stock() {
        let engine = engine(catalog_with_product(), Arc::new(CouponStore::new()));
        let err = engine.validate("s1", &[line(11)], None).await.unwrap_err();
        assert_eq!(err.code, RejectionCode::InsufficientStock);
    }

    #[tokio::test]
    async fn test_unavailable_product() {
        let catalog = catalog_with_product();
        let mut product = catalog.lookup("s1", "noodles").await.unwrap();
        product.is_available = false;
        catalog.upsert("s1", product);

        let engine = engine(catalog, Arc::new(CouponStore::new()));
        let err = engine.validate("s1", &[line(1)], None).await.unwrap_err();
        assert_eq!(err.code, RejectionCode::ProductUnavailable);
    }

    #[tokio::test]
    async fn test_net_identity_holds() {
        let coupons = Arc::new(CouponStore::new());
        let mut coupon = ten_percent_coupon();
        coupon.rule = DiscountRule::FixedAmount { amount: 500.0 };
        coupons.upsert(coupon);
        let engine = engine(catalog_with_product(), coupons);

        let priced = engine
            .validate("s1", &[line(2)], Some("TEN"))
            .await
            .unwrap();

        // Discount capped at gross; net never negative
        assert_eq!(priced.discount_amount, 120.0);
        assert_eq!(priced.net_amount, 0.0);
        assert_eq!(
            priced.net_amount,
            crate::pricing::money::round2(priced.gross_amount - priced.discount_amount)
        );
    }

    #[tokio::test]
    async fn test_prep_time_estimate() {
        let engine = engine(catalog_with_product(), Arc::new(CouponStore::new()));

        // qty 2, no add-ons: 10 + 2×1 = 12
        let priced = engine.validate("s1", &[line(2)], None).await.unwrap();
        assert_eq!(priced.estimated_minutes, 12);

        // qty 1 with one add-on line: 10 + 3 = 13
        let mut input = line(1);
        input.addons = vec![AddonInput {
            addon_id: "egg".to_string(),
            quantity: 1,
        }];
        let priced = engine.validate("s1", &[input], None).await.unwrap();
        assert_eq!(priced.estimated_minutes, 13);
    }
}
