//! OrderService — order creation and the status state machine.
//!
//! # Creation flow
//!
//! ```text
//! create_order(actor, input)
//!     ├─ 1. Tenant ownership + capability check
//!     ├─ 2. Pricing & validation (pure, catalog read only)
//!     ├─ 3. Coupon redemption reserved (atomic with creation, released on failure)
//!     ├─ 4. Conditional stock decrement (rolled back on failure)
//!     ├─ 5. Order number allocated for the store-day
//!     ├─ 6. Order + items + first history entry persisted as one unit
//!     ├─ 7. Redemption committed
//!     └─ 8. Fire-and-forget: kitchen ticket, staff + customer notifications
//! ```
//!
//! # Transition flow
//!
//! Transitions for one order id are serialized behind a per-order async
//! mutex; the store's version check backs that up with bounded retries, so
//! two concurrent requests can never both succeed from the same prior
//! state. History entries are appended in the order transitions actually
//! occurred and the current status always equals the last entry.

use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use chrono_tz::Tz;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use shared::message::EventKind;
use shared::order::{
    Order, OrderKind, OrderStatus, PaymentSignal, PaymentStatus, Rejection, StatusHistoryEntry,
};
use shared::types::{Actor, Role};

use crate::auth::policy::{self, Capability};
use crate::catalog::CatalogAccessor;
use crate::coupons::CouponStore;
use crate::directory::StoreDirectory;
use crate::loyalty::CompletionProcessor;
use crate::notify::Notifier;
use crate::orders::allocator::OrderNumberAllocator;
use crate::orders::store::{OrderStore, StoreError};
use crate::pricing::{LineItemInput, PricingEngine};
use crate::printing::PrintService;
use crate::utils::error::{AppError, AppResult};
use crate::utils::time::effective_business_date;

/// Knobs the service reads from [`crate::core::Config`].
#[derive(Debug, Clone)]
pub struct OrderServiceConfig {
    /// Bounded retries for stale-version conflicts before surfacing
    pub transition_retry_limit: u32,
    pub business_tz: Tz,
    pub business_day_cutoff: NaiveTime,
}

/// Input for order creation, already parsed by the HTTP layer.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub store_id: String,
    pub kind: OrderKind,
    pub items: Vec<LineItemInput>,
    pub coupon_code: Option<String>,
    pub table_no: Option<String>,
    pub note: Option<String>,
}

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogAccessor>,
    coupons: Arc<CouponStore>,
    directory: Arc<dyn StoreDirectory>,
    pricing: PricingEngine,
    allocator: OrderNumberAllocator,
    notifier: Arc<Notifier>,
    completion: Arc<CompletionProcessor>,
    printer: Arc<PrintService>,
    /// Per-order serialization points for the read-modify-append sequence
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    config: OrderServiceConfig,
}

impl OrderService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogAccessor>,
        coupons: Arc<CouponStore>,
        directory: Arc<dyn StoreDirectory>,
        pricing: PricingEngine,
        notifier: Arc<Notifier>,
        completion: Arc<CompletionProcessor>,
        printer: Arc<PrintService>,
        config: OrderServiceConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            coupons,
            directory,
            pricing,
            allocator: OrderNumberAllocator::new(),
            notifier,
            completion,
            printer,
            locks: DashMap::new(),
            config,
        }
    }

    // ========== Creation ==========

    pub async fn create_order(&self, actor: &Actor, input: CreateOrderInput) -> AppResult<Order> {
        policy::require(actor.role, Capability::OrdersCreate)?;
        self.check_store_ownership(actor, &input.store_id)?;

        if input.items.is_empty() {
            return Err(AppError::validation("Order must contain at least one item"));
        }

        let priced = self
            .pricing
            .validate(
                &input.store_id,
                &input.items,
                input.coupon_code.as_deref(),
            )
            .await
            .map_err(AppError::Reject)?;

        // Reserve the coupon use before any other effect; the guard releases
        // it again unless creation commits.
        let redemption = match &input.coupon_code {
            Some(code) => Some(
                self.coupons
                    .clone()
                    .try_redeem(&input.store_id, code, priced.gross_amount)
                    .map_err(AppError::Reject)?,
            ),
            None => None,
        };

        // Conditionally take stock; a partial take is rolled back.
        let mut taken: Vec<(String, u32)> = Vec::new();
        for line in &input.items {
            match self
                .catalog
                .try_decrement_stock(&input.store_id, &line.product_id, line.quantity)
                .await
            {
                Ok(true) => taken.push((line.product_id.clone(), line.quantity)),
                Ok(false) => {
                    self.restore_taken(&input.store_id, &taken).await;
                    return Err(AppError::Reject(Rejection::new(
                        shared::order::RejectionCode::InsufficientStock,
                        format!("Stock for product {} was taken concurrently", line.product_id),
                    )));
                }
                Err(e) => {
                    self.restore_taken(&input.store_id, &taken).await;
                    return Err(AppError::internal(e.to_string()));
                }
            }
        }

        let now = Utc::now();
        let business_date =
            effective_business_date(now, self.config.business_tz, self.config.business_day_cutoff);
        let order_no = self.allocator.allocate(&input.store_id, business_date);

        let order = Order {
            id: Uuid::new_v4(),
            order_no,
            tenant_id: actor.tenant_id.clone(),
            store_id: input.store_id.clone(),
            customer_id: actor.id.clone(),
            customer_name: actor.display_name.clone(),
            kind: input.kind,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            gross_amount: priced.gross_amount,
            discount_amount: priced.discount_amount,
            net_amount: priced.net_amount,
            coupon_code: input.coupon_code.clone(),
            table_no: input.table_no.clone(),
            note: input.note.clone(),
            estimated_minutes: priced.estimated_minutes,
            items: priced.items,
            history: vec![StatusHistoryEntry::new(OrderStatus::Pending, actor, None)],
            version: 1,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.store.insert(order.clone()).await {
            self.restore_taken(&input.store_id, &taken).await;
            // redemption guard drops here and releases the coupon use
            return Err(e.into());
        }
        if let Some(redemption) = redemption {
            redemption.commit();
        }

        info!(
            order_id = %order.id,
            order_no = %order.order_no,
            store_id = %order.store_id,
            net = order.net_amount,
            "Order created"
        );

        self.notifier.order_event(EventKind::OrderCreated, &order);
        Ok(order)
    }

    async fn restore_taken(&self, store_id: &str, taken: &[(String, u32)]) {
        for (product_id, quantity) in taken {
            if let Err(e) = self
                .catalog
                .restore_stock(store_id, product_id, *quantity)
                .await
            {
                warn!(store_id, product_id = %product_id, error = %e, "Failed to restore stock after aborted creation");
            }
        }
    }

    // ========== Transitions ==========

    pub async fn transition(
        &self,
        actor: &Actor,
        order_id: Uuid,
        requested: OrderStatus,
        note: Option<String>,
    ) -> AppResult<Order> {
        let capability = if requested == OrderStatus::Cancelled {
            Capability::OrdersCancel
        } else {
            Capability::OrdersAdvance
        };
        policy::require(actor.role, capability)?;

        let lock = self.order_lock(order_id);
        let _guard = lock.lock().await;

        let mut attempts = 0;
        let updated = loop {
            let mut order = self.store.get(order_id).await?;
            self.check_order_access(actor, &order)?;

            if !order.status.can_transition_to(requested) {
                return Err(AppError::Reject(Rejection::invalid_transition(
                    order.status,
                    requested,
                )));
            }

            let expected_version = order.version;
            order.status = requested;
            order.updated_at = Utc::now();
            order.version += 1;
            order
                .history
                .push(StatusHistoryEntry::new(requested, actor, note.clone()));

            match self.store.update(&order, expected_version).await {
                Ok(()) => break order,
                Err(StoreError::StaleVersion(..)) if attempts < self.config.transition_retry_limit => {
                    attempts += 1;
                    warn!(order_id = %order_id, attempts, "Stale version during transition, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };
        drop(_guard);

        info!(
            order_id = %updated.id,
            order_no = %updated.order_no,
            status = %updated.status,
            actor = %actor.id,
            "Order status changed"
        );

        self.after_transition(&updated);
        Ok(updated)
    }

    /// Best-effort follow-ups; failures are logged, never rolled back.
    fn after_transition(&self, order: &Order) {
        match order.status {
            OrderStatus::Confirmed => {
                self.printer.dispatch_ticket(order);
            }
            OrderStatus::Completed => {
                self.locks.remove(&order.id);
                let completion = self.completion.clone();
                let completed = order.clone();
                tokio::spawn(async move {
                    completion.on_completed(&completed).await;
                });
            }
            OrderStatus::Cancelled => {
                self.locks.remove(&order.id);
                if order.needs_refund_on_cancel() {
                    // Flagged for the payment-gateway collaborator; payment
                    // status becomes Refunded only once the gateway confirms.
                    warn!(
                        order_id = %order.id,
                        order_no = %order.order_no,
                        "Cancelled with completed payment, refund required"
                    );
                }
            }
            _ => {}
        }

        self.notifier
            .order_event(EventKind::OrderStatusChanged, order);
    }

    // ========== Payment signals ==========

    /// React to a gateway outcome. Payment status and order status are
    /// deliberately decoupled: this never forces the state machine into
    /// `Cancelled` — that remains an operator decision.
    pub async fn apply_payment_signal(
        &self,
        order_id: Uuid,
        signal: PaymentSignal,
    ) -> AppResult<Order> {
        let lock = self.order_lock(order_id);
        let _guard = lock.lock().await;

        let mut order = self.store.get(order_id).await?;
        let expected_version = order.version;
        order.payment_status = match signal {
            PaymentSignal::PaymentConfirmed => PaymentStatus::Paid,
            PaymentSignal::PaymentFailed => PaymentStatus::Failed,
            PaymentSignal::Refunded => PaymentStatus::Refunded,
        };
        order.updated_at = Utc::now();
        order.version += 1;
        self.store.update(&order, expected_version).await?;
        drop(_guard);

        info!(
            order_id = %order.id,
            payment_status = ?order.payment_status,
            "Payment status changed"
        );
        self.notifier
            .order_event(EventKind::PaymentStatusChanged, &order);
        Ok(order)
    }

    // ========== Queries (pull-based source of truth) ==========

    pub async fn get_order(&self, actor: &Actor, order_id: Uuid) -> AppResult<Order> {
        let order = self.store.get(order_id).await?;
        self.check_order_access(actor, &order)?;
        Ok(order)
    }

    pub async fn get_history(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> AppResult<Vec<StatusHistoryEntry>> {
        Ok(self.get_order(actor, order_id).await?.history)
    }

    pub async fn list_active_for_store(
        &self,
        actor: &Actor,
        store_id: &str,
    ) -> AppResult<Vec<Order>> {
        self.check_store_ownership(actor, store_id)?;
        Ok(self.store.list_active_for_store(store_id).await?)
    }

    // ========== Access checks ==========

    fn check_store_ownership(&self, actor: &Actor, store_id: &str) -> AppResult<()> {
        match self.directory.tenant_of(store_id) {
            Some(tenant) if tenant == actor.tenant_id => Ok(()),
            Some(_) => Err(AppError::forbidden(format!(
                "Store {} is not owned by tenant {}",
                store_id, actor.tenant_id
            ))),
            None => Err(AppError::not_found(format!("Store {} not found", store_id))),
        }
    }

    /// Customers see and mutate only their own orders; staff and admins are
    /// scoped to their tenant.
    fn check_order_access(&self, actor: &Actor, order: &Order) -> AppResult<()> {
        if order.tenant_id != actor.tenant_id {
            return Err(AppError::forbidden("Order belongs to another tenant"));
        }
        if actor.role == Role::Customer && order.customer_id != actor.id {
            return Err(AppError::forbidden("Order belongs to another customer"));
        }
        Ok(())
    }

    fn order_lock(&self, order_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
