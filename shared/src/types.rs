//! Identity types shared across the API and the notification layer.
//!
//! Authentication itself happens upstream; by the time a request reaches the
//! engine its identity has already been resolved into an [`Actor`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// 操作者角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// 租户管理员（全租户可见）
    Admin,
    /// 门店员工（厨房/收银）
    Staff,
    /// 顾客
    Customer,
}

impl Role {
    /// Parse from the lowercase wire form used in headers ("admin", "staff", "customer")
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Staff => write!(f, "staff"),
            Role::Customer => write!(f, "customer"),
        }
    }
}

/// Resolved identity attached to every mutating operation.
///
/// `tenant_id` scopes what the actor may see; `display_name` is snapshotted
/// into order history entries so the audit trail survives account renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub tenant_id: String,
    pub display_name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(
        id: impl Into<String>,
        tenant_id: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            display_name: display_name.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("STAFF"), Some(Role::Staff));
        assert_eq!(Role::parse("customer"), Some(Role::Customer));
        assert_eq!(Role::parse("waiter"), None);
    }
}
