//! Room-based broadcast hub.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   NotificationHub                        │
//! │  subscribers: DashMap<Uuid, Subscriber (mpsc::Sender)>  │
//! │  rooms:       RwLock<RoomTable>                          │
//! └────────────────────────┬────────────────────────────────┘
//!                          │ publish(room, envelope)
//!              ┌───────────┼───────────┐
//!              ▼           ▼           ▼
//!         tenant:t1     store:s1    user:u1
//! ```
//!
//! Delivery is fire-and-forget to all currently-joined members: `try_send`
//! into each subscriber's bounded channel, drop + log when a buffer is full,
//! lazily disconnect closed receivers. Publish never waits on a slow
//! subscriber. There is no queue, retry, or persistence — every event has a
//! pull-based equivalent, notifications are a latency optimization.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared::message::{Envelope, Room};
use shared::types::Role;

use crate::auth::policy::{self, Capability};
use crate::directory::StoreDirectory;
use crate::utils::error::{AppError, AppResult};

/// Authenticated connection metadata, resolved upstream.
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub tenant_id: String,
    pub user_id: String,
    pub role: Role,
}

/// Receiving side handed to the connection's transport.
pub struct ConnectionHandle {
    pub connection_id: Uuid,
    pub events: mpsc::Receiver<Envelope>,
}

struct Subscriber {
    session: ClientSession,
    tx: mpsc::Sender<Envelope>,
}

/// Membership is kept in both directions so disconnect is O(joined rooms).
#[derive(Default)]
struct RoomTable {
    rooms: HashMap<Room, HashSet<Uuid>>,
    joined: HashMap<Uuid, HashSet<Room>>,
}

impl RoomTable {
    fn join(&mut self, connection_id: Uuid, room: Room) {
        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(connection_id);
        self.joined.entry(connection_id).or_default().insert(room);
    }

    fn leave(&mut self, connection_id: Uuid, room: &Room) {
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
        if let Some(rooms) = self.joined.get_mut(&connection_id) {
            rooms.remove(room);
        }
    }

    fn remove_connection(&mut self, connection_id: Uuid) {
        if let Some(rooms) = self.joined.remove(&connection_id) {
            for room in rooms {
                if let Some(members) = self.rooms.get_mut(&room) {
                    members.remove(&connection_id);
                    if members.is_empty() {
                        self.rooms.remove(&room);
                    }
                }
            }
        }
    }
}

/// Room-based broadcast hub, constructed once per process.
pub struct NotificationHub {
    subscribers: DashMap<Uuid, Subscriber>,
    table: RwLock<RoomTable>,
    directory: Arc<dyn StoreDirectory>,
    channel_capacity: usize,
    shutdown_token: CancellationToken,
}

impl NotificationHub {
    pub fn new(directory: Arc<dyn StoreDirectory>, channel_capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            table: RwLock::new(RoomTable::default()),
            directory,
            channel_capacity,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Register an authenticated connection. Auto-joins its own user room
    /// and its tenant room.
    pub fn connect(&self, session: ClientSession) -> ConnectionHandle {
        let connection_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.channel_capacity);

        let user_room = Room::User(session.user_id.clone());
        let tenant_room = Room::Tenant(session.tenant_id.clone());
        self.subscribers
            .insert(connection_id, Subscriber { session, tx });
        {
            let mut table = self.table.write();
            table.join(connection_id, user_room);
            table.join(connection_id, tenant_room);
        }

        info!(connection_id = %connection_id, "Connection registered");
        ConnectionHandle {
            connection_id,
            events: rx,
        }
    }

    /// Drop a connection and all of its memberships.
    pub fn disconnect(&self, connection_id: Uuid) {
        self.subscribers.remove(&connection_id);
        self.table.write().remove_connection(connection_id);
        debug!(connection_id = %connection_id, "Connection removed");
    }

    /// Join a room, with an explicit authorization check.
    ///
    /// A connection attempting to join a store room its tenant does not own
    /// receives `Forbidden` and is NOT added to the room's membership —
    /// an explicit denial, not silence.
    pub fn join(&self, connection_id: Uuid, room: Room) -> AppResult<()> {
        let session = self
            .subscribers
            .get(&connection_id)
            .map(|s| s.session.clone())
            .ok_or_else(|| AppError::not_found(format!("Connection {} not found", connection_id)))?;

        self.authorize_join(&session, &room)?;
        self.table.write().join(connection_id, room);
        Ok(())
    }

    fn authorize_join(&self, session: &ClientSession, room: &Room) -> AppResult<()> {
        match room {
            Room::User(user_id) => {
                if *user_id != session.user_id {
                    return Err(AppError::forbidden(format!(
                        "Cannot join another user's room {}",
                        room
                    )));
                }
            }
            Room::Tenant(tenant_id) => {
                if *tenant_id != session.tenant_id {
                    return Err(AppError::forbidden(format!(
                        "Cannot join another tenant's room {}",
                        room
                    )));
                }
            }
            Room::Store(store_id) => {
                policy::require(session.role, Capability::JoinStoreRoom)?;
                match self.directory.tenant_of(store_id) {
                    Some(owner) if owner == session.tenant_id => {}
                    _ => {
                        return Err(AppError::forbidden(format!(
                            "Store room {} is not owned by tenant {}",
                            room, session.tenant_id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Leaving a room is always permitted.
    pub fn leave(&self, connection_id: Uuid, room: &Room) {
        self.table.write().leave(connection_id, room);
    }

    /// Fire-and-forget broadcast to all currently-joined members.
    /// Returns the number of subscribers the event was handed to.
    pub fn publish(&self, room: &Room, envelope: Envelope) -> usize {
        let members: Vec<Uuid> = {
            let table = self.table.read();
            match table.rooms.get(room) {
                Some(members) => members.iter().copied().collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for connection_id in members {
            let Some(subscriber) = self.subscribers.get(&connection_id) else {
                continue;
            };
            match subscriber.tx.try_send(envelope.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Never wait on a slow subscriber
                    warn!(
                        connection_id = %connection_id,
                        room = %room,
                        "Subscriber buffer full, dropping event"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(connection_id),
            }
        }
        for connection_id in closed {
            self.disconnect(connection_id);
        }
        delivered
    }

    pub fn is_member(&self, connection_id: Uuid, room: &Room) -> bool {
        self.table
            .read()
            .rooms
            .get(room)
            .is_some_and(|members| members.contains(&connection_id))
    }

    pub fn member_count(&self, room: &Room) -> usize {
        self.table
            .read()
            .rooms
            .get(room)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// 优雅关闭：断开所有连接
    pub fn shutdown(&self) {
        info!("Shutting down notification hub");
        self.shutdown_token.cancel();
        self.subscribers.clear();
        *self.table.write() = RoomTable::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryStoreDirectory;
    use shared::message::{EventKind, TenantBroadcastPayload};

    fn hub() -> NotificationHub {
        let directory = Arc::new(InMemoryStoreDirectory::new());
        directory.register("s1", "t1");
        NotificationHub::new(directory, 16)
    }

    fn staff_session() -> ClientSession {
        ClientSession {
            tenant_id: "t1".to_string(),
            user_id: "staff-1".to_string(),
            role: Role::Staff,
        }
    }

    fn envelope(room: &Room) -> Envelope {
        Envelope::new(
            EventKind::TenantBroadcast,
            room,
            &TenantBroadcastPayload::info("t", "b"),
        )
    }

    #[tokio::test]
    async fn test_auto_join_on_connect() {
        let hub = hub();
        let handle = hub.connect(staff_session());

        assert!(hub.is_member(handle.connection_id, &Room::User("staff-1".into())));
        assert!(hub.is_member(handle.connection_id, &Room::Tenant("t1".into())));
    }

    #[tokio::test]
    async fn test_store_join_requires_ownership() {
        let hub = hub();
        let handle = hub.connect(staff_session());

        assert!(hub.join(handle.connection_id, Room::Store("s1".into())).is_ok());

        // s2 is unknown / not owned by t1 — explicit denial, no membership
        let err = hub
            .join(handle.connection_id, Room::Store("s2".into()))
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(!hub.is_member(handle.connection_id, &Room::Store("s2".into())));
    }

    #[tokio::test]
    async fn test_customer_cannot_join_store_room() {
        let hub = hub();
        let handle = hub.connect(ClientSession {
            tenant_id: "t1".to_string(),
            user_id: "cust-1".to_string(),
            role: Role::Customer,
        });

        let err = hub
            .join(handle.connection_id, Room::Store("s1".into()))
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_publish_reaches_members_only() {
        let hub = hub();
        let mut staff = hub.connect(staff_session());
        hub.join(staff.connection_id, Room::Store("s1".into())).unwrap();

        let mut outsider = hub.connect(ClientSession {
            tenant_id: "t1".to_string(),
            user_id: "staff-2".to_string(),
            role: Role::Staff,
        });

        let room = Room::Store("s1".into());
        let delivered = hub.publish(&room, envelope(&room));
        assert_eq!(delivered, 1);

        assert!(staff.events.try_recv().is_ok());
        assert!(outsider.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_to_empty_room_is_noop() {
        let hub = hub();
        let room = Room::Store("s1".into());
        assert_eq!(hub.publish(&room, envelope(&room)), 0);
    }

    #[tokio::test]
    async fn test_leave_and_disconnect() {
        let hub = hub();
        let handle = hub.connect(staff_session());
        let tenant_room = Room::Tenant("t1".into());

        hub.leave(handle.connection_id, &tenant_room);
        assert!(!hub.is_member(handle.connection_id, &tenant_room));

        hub.disconnect(handle.connection_id);
        assert!(!hub.is_member(handle.connection_id, &Room::User("staff-1".into())));
        assert_eq!(hub.member_count(&Room::User("staff-1".into())), 0);
    }

    #[tokio::test]
    async fn test_full_buffer_drops_without_blocking() {
        let directory = Arc::new(InMemoryStoreDirectory::new());
        let hub = NotificationHub::new(directory, 1);
        let handle = hub.connect(staff_session());
        let room = Room::User("staff-1".into());

        // First fills the buffer, second is dropped; neither blocks
        assert_eq!(hub.publish(&room, envelope(&room)), 1);
        assert_eq!(hub.publish(&room, envelope(&room)), 0);
        drop(handle);
    }
}
