//! Per-audience event shaping.
//!
//! The same underlying state change produces different payloads per room:
//! staff get the full operational picture, the owning customer gets a
//! friendly message and a remaining-time estimate, tenant broadcasts carry
//! an arbitrary message with a severity and may be scoped to a subset of
//! store rooms.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use shared::message::{
    CustomerOrderPayload, Envelope, EventKind, Room, StaffOrderPayload, TenantBroadcastPayload,
};
use shared::order::Order;

use super::hub::NotificationHub;

pub struct Notifier {
    hub: Arc<NotificationHub>,
}

impl Notifier {
    pub fn new(hub: Arc<NotificationHub>) -> Self {
        Self { hub }
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    /// Fan an order change out to both of its audiences.
    pub fn order_event(&self, event: EventKind, order: &Order) {
        self.notify_store_of_order_event(event, order);
        self.notify_customer_of_order_event(event, order);
    }

    /// Operational detail for the store room (kitchen/counter staff).
    pub fn notify_store_of_order_event(&self, event: EventKind, order: &Order) {
        let room = Room::Store(order.store_id.clone());
        let payload = staff_payload(order);
        let delivered = self.hub.publish(&room, Envelope::new(event, &room, &payload));
        debug!(room = %room, event = %event, delivered, "Store notification published");
    }

    /// Customer-facing status for the owning user's room.
    pub fn notify_customer_of_order_event(&self, event: EventKind, order: &Order) {
        let room = Room::User(order.customer_id.clone());
        let payload = customer_payload(order);
        let delivered = self.hub.publish(&room, Envelope::new(event, &room, &payload));
        debug!(room = %room, event = %event, delivered, "Customer notification published");
    }

    /// Administrator-initiated broadcast: tenant-wide, or scoped to an
    /// explicit subset of store rooms. Returns the delivery count.
    pub fn broadcast_to_tenant(
        &self,
        tenant_id: &str,
        payload: &TenantBroadcastPayload,
        store_scope: Option<&[String]>,
    ) -> usize {
        match store_scope {
            Some(stores) => stores
                .iter()
                .map(|store_id| {
                    let room = Room::Store(store_id.clone());
                    self.hub
                        .publish(&room, Envelope::new(EventKind::TenantBroadcast, &room, payload))
                })
                .sum(),
            None => {
                let room = Room::Tenant(tenant_id.to_string());
                self.hub
                    .publish(&room, Envelope::new(EventKind::TenantBroadcast, &room, payload))
            }
        }
    }
}

fn staff_payload(order: &Order) -> StaffOrderPayload {
    StaffOrderPayload {
        order_id: order.id,
        order_no: order.order_no.clone(),
        store_id: order.store_id.clone(),
        status: order.status,
        status_label: order.status.staff_label().to_string(),
        kind: order.kind,
        table_no: order.table_no.clone(),
        customer_name: order.customer_name.clone(),
        items: order.items.clone(),
        gross_amount: order.gross_amount,
        discount_amount: order.discount_amount,
        net_amount: order.net_amount,
        payment_status: order.payment_status,
        note: order.note.clone(),
        placed_at: order.created_at,
    }
}

fn customer_payload(order: &Order) -> CustomerOrderPayload {
    CustomerOrderPayload {
        order_id: order.id,
        order_no: order.order_no.clone(),
        status: order.status,
        message: order.status.customer_message().to_string(),
        estimated_remaining_minutes: order.estimated_remaining_minutes(Utc::now()),
        net_amount: order.net_amount,
        payment_status: order.payment_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryStoreDirectory;
    use crate::notify::ClientSession;
    use shared::order::{OrderItem, OrderKind, OrderStatus, PaymentStatus};
    use shared::types::Role;
    use uuid::Uuid;

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            order_no: "202403090001".to_string(),
            tenant_id: "t1".to_string(),
            store_id: "s1".to_string(),
            customer_id: "cust-1".to_string(),
            customer_name: "Ana".to_string(),
            kind: OrderKind::DineIn,
            status: OrderStatus::Preparing,
            payment_status: PaymentStatus::Paid,
            gross_amount: 120.0,
            discount_amount: 12.0,
            net_amount: 108.0,
            coupon_code: Some("TEN".to_string()),
            table_no: Some("7".to_string()),
            note: None,
            estimated_minutes: 15,
            items: vec![OrderItem {
                product_id: "noodles".to_string(),
                variant_id: None,
                name: "Dan Dan Noodles".to_string(),
                quantity: 2,
                unit_price: 60.0,
                line_total: 120.0,
                addons: vec![],
                note: None,
            }],
            history: vec![],
            version: 3,
            created_at: now,
            updated_at: now,
        }
    }

    fn notifier() -> Notifier {
        let directory = Arc::new(InMemoryStoreDirectory::new());
        directory.register("s1", "t1");
        Notifier::new(Arc::new(NotificationHub::new(directory, 16)))
    }

    #[tokio::test]
    async fn test_audiences_get_different_shapes() {
        let notifier = notifier();
        let hub = notifier.hub().clone();

        let mut staff = hub.connect(ClientSession {
            tenant_id: "t1".to_string(),
            user_id: "staff-1".to_string(),
            role: Role::Staff,
        });
        hub.join(staff.connection_id, Room::Store("s1".into())).unwrap();

        let mut customer = hub.connect(ClientSession {
            tenant_id: "t1".to_string(),
            user_id: "cust-1".to_string(),
            role: Role::Customer,
        });

        notifier.order_event(EventKind::OrderStatusChanged, &order());

        let staff_env = staff.events.try_recv().unwrap();
        let staff_view: StaffOrderPayload = staff_env.parse_payload().unwrap();
        assert_eq!(staff_view.status_label, "IN KITCHEN");
        assert_eq!(staff_view.customer_name, "Ana");
        assert_eq!(staff_view.items.len(), 1);

        let customer_env = customer.events.try_recv().unwrap();
        let customer_view: CustomerOrderPayload = customer_env.parse_payload().unwrap();
        assert_eq!(customer_view.message, "Your order is being prepared");
        assert!(customer_view.estimated_remaining_minutes <= 15);
    }

    #[tokio::test]
    async fn test_scoped_broadcast_hits_store_rooms_only() {
        let notifier = notifier();
        let hub = notifier.hub().clone();

        let mut joined = hub.connect(ClientSession {
            tenant_id: "t1".to_string(),
            user_id: "staff-1".to_string(),
            role: Role::Staff,
        });
        hub.join(joined.connection_id, Room::Store("s1".into())).unwrap();

        // Tenant-room-only member, not in store room
        let mut tenant_only = hub.connect(ClientSession {
            tenant_id: "t1".to_string(),
            user_id: "staff-2".to_string(),
            role: Role::Staff,
        });

        let payload = TenantBroadcastPayload::warning("Stock", "86 the salmon");
        let delivered =
            notifier.broadcast_to_tenant("t1", &payload, Some(&["s1".to_string()]));
        assert_eq!(delivered, 1);
        assert!(joined.events.try_recv().is_ok());
        assert!(tenant_only.events.try_recv().is_err());

        // Unscoped broadcast reaches the whole tenant room
        let delivered = notifier.broadcast_to_tenant("t1", &payload, None);
        assert_eq!(delivered, 2);
    }
}
