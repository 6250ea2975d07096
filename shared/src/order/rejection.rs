//! 拒绝码（前端负责本地化）
//!
//! | 分类 | 码 | 处理 |
//! |------|----|------|
//! | 输入/校验 | PRODUCT_UNAVAILABLE .. MINIMUM_NOT_MET | 返回调用方，不重试，不产生部分订单 |
//! | 状态机 | INVALID_TRANSITION | 携带 from/to，不自动纠正 |
//! | 并发 | ALLOCATION_CONFLICT / STALE_VERSION | 服务端有限重试后才上报 |

use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// Rejection codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionCode {
    // ========== Input / validation ==========
    ProductUnavailable,
    InvalidVariant,
    InvalidAddon,
    AddonLimitExceeded,
    InsufficientStock,
    CouponInvalid,
    CouponExpired,
    CouponLimitReached,
    MinimumNotMet,
    ValidationTimeout,
    // ========== State machine ==========
    InvalidTransition,
    // ========== Concurrency (retried internally first) ==========
    AllocationConflict,
    StaleVersion,
    // ========== Authorization / lookup ==========
    Forbidden,
    OrderNotFound,
    // ========== Fallback ==========
    InternalError,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCode::ProductUnavailable => "PRODUCT_UNAVAILABLE",
            RejectionCode::InvalidVariant => "INVALID_VARIANT",
            RejectionCode::InvalidAddon => "INVALID_ADDON",
            RejectionCode::AddonLimitExceeded => "ADDON_LIMIT_EXCEEDED",
            RejectionCode::InsufficientStock => "INSUFFICIENT_STOCK",
            RejectionCode::CouponInvalid => "COUPON_INVALID",
            RejectionCode::CouponExpired => "COUPON_EXPIRED",
            RejectionCode::CouponLimitReached => "COUPON_LIMIT_REACHED",
            RejectionCode::MinimumNotMet => "MINIMUM_NOT_MET",
            RejectionCode::ValidationTimeout => "VALIDATION_TIMEOUT",
            RejectionCode::InvalidTransition => "INVALID_TRANSITION",
            RejectionCode::AllocationConflict => "ALLOCATION_CONFLICT",
            RejectionCode::StaleVersion => "STALE_VERSION",
            RejectionCode::Forbidden => "FORBIDDEN",
            RejectionCode::OrderNotFound => "ORDER_NOT_FOUND",
            RejectionCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// A typed rejection: machine-readable code plus a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{}: {}", .code.as_str(), .message)]
pub struct Rejection {
    pub code: RejectionCode,
    pub message: String,
}

impl Rejection {
    pub fn new(code: RejectionCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Illegal transitions must report the attempted from/to pair.
    pub fn invalid_transition(from: OrderStatus, to: OrderStatus) -> Self {
        Self::new(
            RejectionCode::InvalidTransition,
            format!("illegal transition {} -> {}", from, to),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_reports_pair() {
        let rejection = Rejection::invalid_transition(OrderStatus::Pending, OrderStatus::Preparing);
        assert_eq!(rejection.code, RejectionCode::InvalidTransition);
        assert!(rejection.message.contains("PENDING"));
        assert!(rejection.message.contains("PREPARING"));
    }

    #[test]
    fn test_wire_form() {
        let json = serde_json::to_string(&RejectionCode::AddonLimitExceeded).unwrap();
        assert_eq!(json, "\"ADDON_LIMIT_EXCEEDED\"");
    }
}
