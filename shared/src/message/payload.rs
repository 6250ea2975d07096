//! Per-audience event payloads.
//!
//! The same underlying state change is shaped differently per room: staff
//! get operational detail, the owning customer gets a friendly message and
//! a remaining-time estimate, tenant broadcasts carry free-form content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::{OrderItem, OrderKind, OrderStatus, PaymentStatus};

/// Operational payload for store rooms (kitchen/counter staff).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffOrderPayload {
    pub order_id: uuid::Uuid,
    pub order_no: String,
    pub store_id: String,
    pub status: OrderStatus,
    /// Staff-facing status label, e.g. "IN KITCHEN"
    pub status_label: String,
    pub kind: OrderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_no: Option<String>,
    pub customer_name: String,
    /// Full item list, including add-ons and notes
    pub items: Vec<OrderItem>,
    pub gross_amount: f64,
    pub discount_amount: f64,
    pub net_amount: f64,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub placed_at: DateTime<Utc>,
}

/// Customer-facing payload for the owning user's room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerOrderPayload {
    pub order_id: uuid::Uuid,
    pub order_no: String,
    pub status: OrderStatus,
    /// Friendly status message, e.g. "Your order is being prepared"
    pub message: String,
    /// Display estimate of minutes remaining; 0 once ready or terminal
    pub estimated_remaining_minutes: u32,
    pub net_amount: f64,
    pub payment_status: PaymentStatus,
}

/// 广播级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Administrator-initiated tenant-wide (or store-scoped) broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantBroadcastPayload {
    pub title: String,
    pub body: String,
    pub severity: Severity,
}

impl TenantBroadcastPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            severity,
        }
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body, Severity::Info)
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body, Severity::Warning)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body, Severity::Error)
    }
}
