//! Coupon store and atomic redemption.
//!
//! The usage counter is the clearest shared-mutable resource contended by
//! concurrent order creations: its increment must be tied to order creation
//! or more orders than the usage limit permits can succeed. Redemption is
//! therefore a reserve-then-create guard: [`CouponStore::try_redeem`]
//! re-checks every constraint and increments the counter under the coupon's
//! entry lock *before* the order is inserted, and the returned
//! [`CouponRedemption`] decrements it again on drop unless committed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

use shared::coupon::{Coupon, DiscountRule};
use shared::order::{Rejection, RejectionCode};

use crate::pricing::money::{to_decimal, to_f64};

fn coupon_key(store_id: &str, code: &str) -> String {
    format!("{}:{}", store_id, code)
}

/// Validate a coupon against an order gross and compute the discount.
///
/// Pure: used read-only by the pricing engine and re-run (checks only) under
/// the entry lock at redemption time. Discount is capped at the coupon's
/// configured maximum and again at gross — it can never exceed gross, so the
/// net amount can never go negative.
pub fn discount_for(coupon: &Coupon, gross: f64, now: DateTime<Utc>) -> Result<f64, Rejection> {
    check_constraints(coupon, gross, now)?;

    let gross_dec = to_decimal(gross);
    let raw = match &coupon.rule {
        DiscountRule::Percentage { percent } => {
            gross_dec * to_decimal(*percent) / Decimal::ONE_HUNDRED
        }
        DiscountRule::FixedAmount { amount } => to_decimal(*amount),
        // Shipping is out of scope for this engine
        DiscountRule::FreeDelivery => Decimal::ZERO,
    };

    let capped = match coupon.max_discount {
        Some(max) => raw.min(to_decimal(max)),
        None => raw,
    };
    Ok(to_f64(capped.min(gross_dec).max(Decimal::ZERO)))
}

fn check_constraints(coupon: &Coupon, gross: f64, now: DateTime<Utc>) -> Result<(), Rejection> {
    if !coupon.is_active {
        return Err(Rejection::new(
            RejectionCode::CouponInvalid,
            format!("Coupon {} is not active", coupon.code),
        ));
    }
    if !coupon.is_within_window(now) {
        return Err(Rejection::new(
            RejectionCode::CouponExpired,
            format!("Coupon {} is outside its validity window", coupon.code),
        ));
    }
    if !coupon.has_remaining_use() {
        return Err(Rejection::new(
            RejectionCode::CouponLimitReached,
            format!("Coupon {} has reached its usage limit", coupon.code),
        ));
    }
    if let Some(min) = coupon.min_order_amount
        && gross < min
    {
        return Err(Rejection::new(
            RejectionCode::MinimumNotMet,
            format!(
                "Order total {:.2} is below the coupon minimum {:.2}",
                gross, min
            ),
        ));
    }
    Ok(())
}

/// Store-scoped coupon table.
#[derive(Debug, Default)]
pub struct CouponStore {
    coupons: DashMap<String, Coupon>,
}

impl CouponStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, coupon: Coupon) {
        self.coupons
            .insert(coupon_key(&coupon.store_id, &coupon.code), coupon);
    }

    pub fn get(&self, store_id: &str, code: &str) -> Option<Coupon> {
        self.coupons.get(&coupon_key(store_id, code)).map(|c| c.clone())
    }

    pub fn used_count(&self, store_id: &str, code: &str) -> Option<u32> {
        self.coupons
            .get(&coupon_key(store_id, code))
            .map(|c| c.used_count)
    }

    /// Atomically re-check constraints and take one use of the coupon.
    ///
    /// Takes the `Arc` so the returned guard can undo the increment if
    /// order creation subsequently fails.
    pub fn try_redeem(
        self: Arc<Self>,
        store_id: &str,
        code: &str,
        gross: f64,
    ) -> Result<CouponRedemption, Rejection> {
        let key = coupon_key(store_id, code);
        {
            let mut entry = self.coupons.get_mut(&key).ok_or_else(|| {
                Rejection::new(
                    RejectionCode::CouponInvalid,
                    format!("Unknown coupon code {}", code),
                )
            })?;

            check_constraints(&entry, gross, Utc::now())?;
            entry.used_count += 1;
        }

        Ok(CouponRedemption {
            store: self,
            key,
            committed: false,
        })
    }

    fn release(&self, key: &str) {
        if let Some(mut entry) = self.coupons.get_mut(key) {
            entry.used_count = entry.used_count.saturating_sub(1);
        }
    }
}

/// Guard over a reserved coupon use.
///
/// Dropping without [`commit`](Self::commit) releases the reservation.
#[must_use = "dropping an uncommitted redemption releases the coupon use"]
#[derive(Debug)]
pub struct CouponRedemption {
    store: Arc<CouponStore>,
    key: String,
    committed: bool,
}

impl CouponRedemption {
    /// Keep the usage increment — the order was durably created.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for CouponRedemption {
    fn drop(&mut self) {
        if !self.committed {
            self.store.release(&self.key);
        }
    }
}
