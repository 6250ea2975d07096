//! Completion Side-Effect Processor and the Customer Ledger boundary.
//!
//! Runs after an order is already durably `Completed`. All three effects —
//! points, lifetime spend, tier — are best-effort: a failure in any one is
//! logged and never retried synchronously, never blocks the caller and
//! never rolls back the completed order.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use shared::order::Order;

use crate::pricing::money::floor_div;

/// 积分流水原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointReason {
    Earned,
    Redeemed,
    Adjusted,
}

/// 会员等级，按累计消费划定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Tier from cumulative spend: Bronze < 1000 ≤ Silver < 5000 ≤ Gold < 10000 ≤ Platinum
pub fn tier_for_spend(total: f64) -> Tier {
    if total >= 10_000.0 {
        Tier::Platinum
    } else if total >= 5_000.0 {
        Tier::Gold
    } else if total >= 1_000.0 {
        Tier::Silver
    } else {
        Tier::Bronze
    }
}

/// Loyalty points for a completed order: floor(net / 10)
pub fn points_for_net(net_amount: f64) -> i64 {
    floor_div(net_amount, 10)
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Customer Ledger — external collaborator boundary.
#[async_trait]
pub trait CustomerLedger: Send + Sync {
    async fn add_points(
        &self,
        user_id: &str,
        amount: i64,
        reason: PointReason,
    ) -> Result<(), LedgerError>;

    /// Add to lifetime spend, returning the new cumulative total.
    async fn add_spend(&self, user_id: &str, amount: f64) -> Result<f64, LedgerError>;

    async fn set_tier(&self, user_id: &str, tier: Tier) -> Result<(), LedgerError>;
}

/// Invoked once per order reaching `Completed`.
pub struct CompletionProcessor {
    ledger: Arc<dyn CustomerLedger>,
}

impl CompletionProcessor {
    pub fn new(ledger: Arc<dyn CustomerLedger>) -> Self {
        Self { ledger }
    }

    pub async fn on_completed(&self, order: &Order) {
        let points = points_for_net(order.net_amount);
        if points > 0
            && let Err(e) = self
                .ledger
                .add_points(&order.customer_id, points, PointReason::Earned)
                .await
        {
            warn!(order_id = %order.id, error = %e, "Failed to credit loyalty points");
        }

        match self.ledger.add_spend(&order.customer_id, order.net_amount).await {
            Ok(new_total) => {
                let before = tier_for_spend(new_total - order.net_amount);
                let after = tier_for_spend(new_total);
                if before != after {
                    match self.ledger.set_tier(&order.customer_id, after).await {
                        Ok(()) => info!(
                            customer_id = %order.customer_id,
                            tier = ?after,
                            lifetime_spend = new_total,
                            "Loyalty tier upgraded"
                        ),
                        Err(e) => {
                            warn!(order_id = %order.id, error = %e, "Failed to persist tier change")
                        }
                    }
                }
            }
            Err(e) => warn!(order_id = %order.id, error = %e, "Failed to record lifetime spend"),
        }
    }
}

/// In-process ledger used by the server runtime and tests.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: DashMap<String, LedgerAccount>,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerAccount {
    pub points: i64,
    pub lifetime_spend: f64,
    pub tier: Tier,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, user_id: &str) -> Option<LedgerAccount> {
        self.accounts.get(user_id).map(|a| a.clone())
    }
}

#[async_trait]
impl CustomerLedger for InMemoryLedger {
    async fn add_points(
        &self,
        user_id: &str,
        amount: i64,
        _reason: PointReason,
    ) -> Result<(), LedgerError> {
        self.accounts.entry(user_id.to_string()).or_default().points += amount;
        Ok(())
    }

    async fn add_spend(&self, user_id: &str, amount: f64) -> Result<f64, LedgerError> {
        let mut account = self.accounts.entry(user_id.to_string()).or_default();
        account.lifetime_spend += amount;
        Ok(account.lifetime_spend)
    }

    async fn set_tier(&self, user_id: &str, tier: Tier) -> Result<(), LedgerError> {
        self.accounts.entry(user_id.to_string()).or_default().tier = tier;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::order::{OrderKind, OrderStatus, PaymentStatus};
    use uuid::Uuid;

    fn completed_order(net: f64) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            order_no: "202403090001".to_string(),
            tenant_id: "t1".to_string(),
            store_id: "s1".to_string(),
            customer_id: "u1".to_string(),
            customer_name: "Ana".to_string(),
            kind: OrderKind::Takeout,
            status: OrderStatus::Completed,
            payment_status: PaymentStatus::Paid,
            gross_amount: net,
            discount_amount: 0.0,
            net_amount: net,
            coupon_code: None,
            table_no: None,
            note: None,
            estimated_minutes: 10,
            items: vec![],
            history: vec![],
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_points_example() {
        // net 108 ⇒ floor(108/10) = 10 points
        assert_eq!(points_for_net(108.0), 10);
        assert_eq!(points_for_net(9.99), 0);
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(tier_for_spend(999.99), Tier::Bronze);
        assert_eq!(tier_for_spend(1_000.0), Tier::Silver);
        assert_eq!(tier_for_spend(4_999.0), Tier::Silver);
        assert_eq!(tier_for_spend(5_000.0), Tier::Gold);
        assert_eq!(tier_for_spend(10_000.0), Tier::Platinum);
    }

    #[tokio::test]
    async fn test_on_completed_credits_ledger() {
        let ledger = Arc::new(InMemoryLedger::new());
        let processor = CompletionProcessor::new(ledger.clone());

        processor.on_completed(&completed_order(108.0)).await;

        let account = ledger.account("u1").unwrap();
        assert_eq!(account.points, 10);
        assert_eq!(account.lifetime_spend, 108.0);
        assert_eq!(account.tier, Tier::Bronze);
    }

    #[tokio::test]
    async fn test_tier_change_persisted_on_crossing() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.add_spend("u1", 950.0).await.unwrap();
        let processor = CompletionProcessor::new(ledger.clone());

        processor.on_completed(&completed_order(100.0)).await;

        let account = ledger.account("u1").unwrap();
        assert_eq!(account.lifetime_spend, 1_050.0);
        assert_eq!(account.tier, Tier::Silver);
    }
}
