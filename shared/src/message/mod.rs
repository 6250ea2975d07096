//! 实时通知消息类型定义
//!
//! 这些类型在 order-server 和客户端之间共享。同一个底层状态变更会按
//! 受众整形为不同载荷（见 [`payload`]）：门店房间收到运营细节，顾客
//! 房间收到面向顾客的状态消息，租户广播携带任意消息和级别。
//!
//! 投递语义是 fire-and-forget：未加入房间或当前未连接的订阅者收不到
//! 事件，也不会补投 — 每个事件都有等价的拉取查询，通知只是延迟优化。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// 新订单已创建
    OrderCreated,
    /// 订单状态已变更
    OrderStatusChanged,
    /// 支付状态已变更（与订单状态解耦）
    PaymentStatusChanged,
    /// 租户级广播
    TenantBroadcast,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::OrderCreated => write!(f, "order_created"),
            EventKind::OrderStatusChanged => write!(f, "order_status_changed"),
            EventKind::PaymentStatusChanged => write!(f, "payment_status_changed"),
            EventKind::TenantBroadcast => write!(f, "tenant_broadcast"),
        }
    }
}

/// A named subscriber group. Membership is ephemeral — tied to connection
/// lifetime, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Room {
    Tenant(String),
    Store(String),
    User(String),
}

impl Room {
    /// Canonical key, used as the envelope's room field.
    pub fn key(&self) -> String {
        match self {
            Room::Tenant(id) => format!("tenant:{}", id),
            Room::Store(id) => format!("store:{}", id),
            Room::User(id) => format!("user:{}", id),
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Wire envelope delivered to room members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event_id: Uuid,
    pub event: EventKind,
    /// Room key this envelope was published to
    pub room: String,
    pub payload: serde_json::Value,
    pub emitted_at: DateTime<Utc>,
}

impl Envelope {
    pub fn new<T: Serialize>(event: EventKind, room: &Room, payload: &T) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event,
            room: room.key(),
            payload: serde_json::to_value(payload).expect("Failed to serialize event payload"),
            emitted_at: Utc::now(),
        }
    }

    /// 解析载荷为指定类型
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_keys() {
        assert_eq!(Room::Tenant("t1".into()).key(), "tenant:t1");
        assert_eq!(Room::Store("s1".into()).key(), "store:s1");
        assert_eq!(Room::User("u1".into()).key(), "user:u1");
    }

    #[test]
    fn test_envelope_roundtrip() {
        let payload = TenantBroadcastPayload::info("Maintenance", "Closing early today");
        let envelope = Envelope::new(
            EventKind::TenantBroadcast,
            &Room::Tenant("t1".into()),
            &payload,
        );

        assert_eq!(envelope.room, "tenant:t1");
        let parsed: TenantBroadcastPayload = envelope.parse_payload().unwrap();
        assert_eq!(parsed.title, "Maintenance");
        assert_eq!(parsed.severity, Severity::Info);
    }
}
