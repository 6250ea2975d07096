//! Order status state machine.
//!
//! ```text
//! Pending ──▶ Confirmed ──▶ Preparing ──▶ Ready ──▶ Completed
//!    │            │             │
//!    └────────────┴─────────────┴──────▶ Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal; any pair not in the table is
//! illegal, including staying in place. The table here is the single source
//! of truth — the transition service consults it and nothing else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 已提交，待门店确认
    Pending,
    /// 门店已接单
    Confirmed,
    /// 制作中
    Preparing,
    /// 可取餐/待上菜
    Ready,
    /// 已完成（终态）
    Completed,
    /// 已取消（终态）
    Cancelled,
}

impl OrderStatus {
    /// The complete set of states legally reachable from `self`.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Preparing, OrderStatus::Cancelled],
            OrderStatus::Preparing => &[OrderStatus::Ready, OrderStatus::Cancelled],
            OrderStatus::Ready => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Operational label shown to kitchen/counter staff.
    pub fn staff_label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "NEW",
            OrderStatus::Confirmed => "ACCEPTED",
            OrderStatus::Preparing => "IN KITCHEN",
            OrderStatus::Ready => "READY FOR PICKUP",
            OrderStatus::Completed => "CLOSED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Customer-facing status message.
    pub fn customer_message(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Your order has been received",
            OrderStatus::Confirmed => "The store has accepted your order",
            OrderStatus::Preparing => "Your order is being prepared",
            OrderStatus::Ready => "Your order is ready",
            OrderStatus::Completed => "Your order is complete, enjoy!",
            OrderStatus::Cancelled => "Your order has been cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Confirmed => write!(f, "CONFIRMED"),
            OrderStatus::Preparing => write!(f, "PREPARING"),
            OrderStatus::Ready => write!(f, "READY"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}
