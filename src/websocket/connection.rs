use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::types::WsMessage;

pub type WsSender = mpsc::UnboundedSender<WsMessage>;

/// Identifies one socket; a user may hold several at once.
pub type ConnectionId = u64;

/// Per-user rooms. Each room holds the live connections that joined it.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<Uuid, HashMap<ConnectionId, WsSender>>>,
    next_id: Arc<AtomicU64>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn join(&self, room: Uuid, connection: ConnectionId, sender: WsSender) {
        self.rooms.entry(room).or_default().insert(connection, sender);
        tracing::debug!("Connection {} joined room of user {}", connection, room);
    }

    pub fn leave(&self, room: Uuid, connection: ConnectionId) {
        let now_empty = match self.rooms.get_mut(&room) {
            Some(mut members) => {
                members.remove(&connection);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.rooms.remove_if(&room, |_, members| members.is_empty());
        }
    }

    /// Removes `connection` from every room it joined.
    pub fn leave_all(&self, connection: ConnectionId) {
        self.rooms.retain(|_, members| {
            members.remove(&connection);
            !members.is_empty()
        });
    }

    /// At-most-once delivery to every connection in the room. Closed
    /// connections are pruned. Returns how many connections accepted it.
    pub fn send_to_user(&self, room: Uuid, message: WsMessage) -> usize {
        let mut delivered = 0;
        let mut now_empty = false;

        if let Some(mut members) = self.rooms.get_mut(&room) {
            members.retain(|_, sender| {
                let ok = sender.send(message.clone()).is_ok();
                if ok {
                    delivered += 1;
                }
                ok
            });
            now_empty = members.is_empty();
        }
        if now_empty {
            self.rooms.remove_if(&room, |_, members| members.is_empty());
        }

        delivered
    }

    pub fn is_user_online(&self, room: Uuid) -> bool {
        self.rooms.get(&room).map_or(false, |members| !members.is_empty())
    }

    pub fn room_size(&self, room: Uuid) -> usize {
        self.rooms.get(&room).map_or(0, |members| members.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::types::ErrorPayload;

    fn ping() -> WsMessage {
        WsMessage::Error(ErrorPayload {
            message: "ping".into(),
        })
    }

    #[test]
    fn test_send_reaches_every_connection_in_room() {
        let registry = RoomRegistry::new();
        let user = Uuid::new_v4();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        registry.join(user, registry.next_connection_id(), tx1);
        registry.join(user, registry.next_connection_id(), tx2);

        assert_eq!(registry.send_to_user(user, ping()), 2);
        assert_eq!(rx1.try_recv().unwrap(), ping());
        assert_eq!(rx2.try_recv().unwrap(), ping());
        assert_eq!(registry.send_to_user(Uuid::new_v4(), ping()), 0);
    }

    #[test]
    fn test_closed_connections_are_pruned() {
        let registry = RoomRegistry::new();
        let user = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.join(user, registry.next_connection_id(), tx);
        drop(rx);

        assert_eq!(registry.send_to_user(user, ping()), 0);
        assert!(!registry.is_user_online(user));
    }

    #[test]
    fn test_leave_all_clears_every_room_of_a_connection() {
        let registry = RoomRegistry::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let conn = registry.next_connection_id();
        let other = registry.next_connection_id();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (tx_other, _rx_other) = mpsc::unbounded_channel();

        registry.join(a, conn, tx.clone());
        registry.join(b, conn, tx);
        registry.join(b, other, tx_other);

        registry.leave_all(conn);
        assert_eq!(registry.room_size(a), 0);
        assert_eq!(registry.room_size(b), 1);

        registry.leave(b, other);
        assert!(!registry.is_user_online(b));
    }
}
