//! Order, line items and status history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderStatus;
use crate::types::Actor;

/// 订单类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    /// 堂食
    #[default]
    DineIn,
    /// 外带
    Takeout,
    /// 配送
    Delivery,
    /// 第三方渠道（外卖平台等）
    External,
}

/// Payment status — an independent lifecycle from [`OrderStatus`].
///
/// A gateway failure changes payment status only; it never forces the order
/// state machine into `Cancelled`. `Refunded` is entered only once the
/// gateway confirms the refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Failed,
    Refunded,
}

/// Inbound signal from the payment gateway, keyed by order id.
/// The engine never initiates gateway calls; it only reacts to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentSignal {
    PaymentConfirmed,
    PaymentFailed,
    Refunded,
}

/// Selected add-on on a line item. Unit price is frozen at validation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonSelection {
    pub addon_id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
}

/// One order line. Belongs to exactly one order; immutable after creation.
///
/// `unit_price` and `line_total` are computed at validation time and frozen
/// thereafter — never recomputed from a later catalog state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    /// Display name snapshot (product, plus variant when selected)
    pub name: String,
    pub quantity: u32,
    /// Frozen: variant price (or base price) + Σ(add-on price × add-on qty)
    pub unit_price: f64,
    /// Frozen: unit_price × quantity
    pub line_total: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addons: Vec<AddonSelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// 状态历史条目 — 仅追加，永不删除
///
/// 不变量：条目数 == 订单经历的状态变更数（含创建），
/// 且最后一条的 status 恒等于订单当前 status。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub actor_id: String,
    pub actor_name: String,
    pub at: DateTime<Utc>,
}

impl StatusHistoryEntry {
    pub fn new(status: OrderStatus, actor: &Actor, note: Option<String>) -> Self {
        Self {
            status,
            note,
            actor_id: actor.id.clone(),
            actor_name: actor.display_name.clone(),
            at: Utc::now(),
        }
    }
}

/// An order. Owned by the store; referenced by, but not owned by, the
/// customer. Created atomically with its line items and first history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Global identity
    pub id: Uuid,
    /// Store-scoped human-readable number: effective date + zero-padded sequence
    pub order_no: String,
    pub tenant_id: String,
    pub store_id: String,
    pub customer_id: String,
    /// Customer display name snapshot for staff-facing views
    pub customer_name: String,
    pub kind: OrderKind,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Pre-discount total: Σ line totals
    pub gross_amount: f64,
    /// 0 ≤ discount ≤ gross, always
    pub discount_amount: f64,
    /// net = gross − discount, never negative
    pub net_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Display-only preparation estimate, minutes
    pub estimated_minutes: u32,
    pub items: Vec<OrderItem>,
    pub history: Vec<StatusHistoryEntry>,
    /// Optimistic-concurrency version, bumped on every mutation
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether cancelling now leaves a completed payment needing a refund.
    pub fn needs_refund_on_cancel(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Minutes of the display estimate still remaining, clamped at zero.
    /// Terminal and ready orders have nothing left to wait for.
    pub fn estimated_remaining_minutes(&self, now: DateTime<Utc>) -> u32 {
        if matches!(
            self.status,
            OrderStatus::Ready | OrderStatus::Completed | OrderStatus::Cancelled
        ) {
            return 0;
        }
        let elapsed = (now - self.created_at).num_minutes().max(0) as u64;
        (self.estimated_minutes as u64).saturating_sub(elapsed) as u32
    }
}
