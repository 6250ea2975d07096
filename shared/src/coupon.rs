//! Store-scoped coupon model.
//!
//! A coupon application is all-or-nothing: either every constraint holds at
//! redemption time or the order is rejected before any persistent effect.
//! The usage counter is only ever advanced by the server's redemption path,
//! atomically with order creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 折扣规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountRule {
    /// 百分比折扣（percent 为 0-100）
    Percentage { percent: f64 },
    /// 固定金额折扣
    FixedAmount { amount: f64 },
    /// 免配送费 — 配送费不在本引擎范围内，折扣额为 0
    FreeDelivery,
}

/// Store-scoped coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub store_id: String,
    pub rule: DiscountRule,
    /// Gross amount the order must reach before the coupon applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order_amount: Option<f64>,
    /// Upper bound on the computed discount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount: Option<f64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    /// Times this coupon has been redeemed (server-maintained)
    #[serde(default)]
    pub used_count: u32,
    /// `None` means unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
}

impl Coupon {
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_from && now <= self.valid_until
    }

    pub fn has_remaining_use(&self) -> bool {
        match self.usage_limit {
            Some(limit) => self.used_count < limit,
            None => true,
        }
    }
}
