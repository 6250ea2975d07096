//! Capability policy.
//!
//! 每个操作声明一个所需能力，入口处检查一次 —
//! 不在各 handler 里散落角色名字符串比较。
//!
//! | 角色 | 能力 |
//! |------|------|
//! | admin | 全部 |
//! | staff | 下单、推进、取消、加入门店房间 |
//! | customer | 下单、取消（仅自己的订单，归属检查在订单服务） |

use shared::types::Role;

use crate::utils::error::{AppError, AppResult};

/// Required-capability set entries, one per exposed operation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create orders
    OrdersCreate,
    /// Advance an order along the happy path
    OrdersAdvance,
    /// Cancel an order
    OrdersCancel,
    /// Tenant-wide broadcast
    TenantBroadcast,
    /// Join a store room (operational detail)
    JoinStoreRoom,
}

/// Capabilities granted to a role.
pub fn capabilities_of(role: Role) -> &'static [Capability] {
    match role {
        Role::Admin => &[
            Capability::OrdersCreate,
            Capability::OrdersAdvance,
            Capability::OrdersCancel,
            Capability::TenantBroadcast,
            Capability::JoinStoreRoom,
        ],
        Role::Staff => &[
            Capability::OrdersCreate,
            Capability::OrdersAdvance,
            Capability::OrdersCancel,
            Capability::JoinStoreRoom,
        ],
        Role::Customer => &[Capability::OrdersCreate, Capability::OrdersCancel],
    }
}

/// Evaluate the policy once for an operation.
pub fn require(role: Role, capability: Capability) -> AppResult<()> {
    if capabilities_of(role).contains(&capability) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Role {} lacks capability {:?}",
            role, capability
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_cannot_advance() {
        assert!(require(Role::Customer, Capability::OrdersCreate).is_ok());
        assert!(require(Role::Customer, Capability::OrdersCancel).is_ok());
        assert!(require(Role::Customer, Capability::OrdersAdvance).is_err());
        assert!(require(Role::Customer, Capability::JoinStoreRoom).is_err());
    }

    #[test]
    fn test_only_admin_broadcasts() {
        assert!(require(Role::Admin, Capability::TenantBroadcast).is_ok());
        assert!(require(Role::Staff, Capability::TenantBroadcast).is_err());
        assert!(require(Role::Customer, Capability::TenantBroadcast).is_err());
    }
}
