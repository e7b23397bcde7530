use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{AppError, AppResult};

pub type ConnectionId = u64;

struct Subscriber {
    id: ConnectionId,
    tx: UnboundedSender<String>,
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    event: &'a str,
    data: T,
}

/// Serializes one server event as `{"event": ..., "data": ...}`.
pub fn encode_frame<T: Serialize>(event: &str, data: T) -> AppResult<String> {
    serde_json::to_string(&Envelope { event, data }).map_err(|e| AppError::Internal(e.into()))
}

/// Room name to live socket subscribers.
/// A connection may sit in several rooms at once.
pub struct RoomHub {
    rooms: DashMap<String, Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl RoomHub {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn join(&self, room: &str, conn: ConnectionId, tx: UnboundedSender<String>) {
        let mut subscribers = self.rooms.entry(room.to_string()).or_default();
        if !subscribers.iter().any(|s| s.id == conn) {
            subscribers.push(Subscriber { id: conn, tx });
        }
    }

    pub fn leave(&self, room: &str, conn: ConnectionId) {
        if let Some(mut subscribers) = self.rooms.get_mut(room) {
            subscribers.retain(|s| s.id != conn);
            if subscribers.is_empty() {
                drop(subscribers);
                self.rooms.remove_if(room, |_, subs| subs.is_empty());
            }
        }
    }

    pub fn leave_all(&self, conn: ConnectionId) {
        self.rooms.retain(|_, subscribers| {
            subscribers.retain(|s| s.id != conn);
            !subscribers.is_empty()
        });
    }

    /// Sends `{event, data}` to every live subscriber of `room` and returns
    /// how many received it. Closed channels are dropped from the room.
    pub fn emit<T: Serialize>(&self, room: &str, event: &str, data: T) -> AppResult<usize> {
        let frame = encode_frame(event, data)?;

        let Some(mut subscribers) = self.rooms.get_mut(room) else {
            tracing::debug!(room, event, "no subscribers");
            return Ok(0);
        };
        subscribers.retain(|s| s.tx.send(frame.clone()).is_ok());
        let delivered = subscribers.len();
        if subscribers.is_empty() {
            drop(subscribers);
            self.rooms.remove_if(room, |_, subs| subs.is_empty());
        }
        tracing::debug!(room, event, delivered, "emitted");
        Ok(delivered)
    }

    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map(|subs| subs.len()).unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn emit_reaches_only_room_members() {
        let hub = RoomHub::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = hub.next_connection_id();
        let b = hub.next_connection_id();
        hub.join("restaurant_1", a, tx_a);
        hub.join("user_2", b, tx_b);

        let sent = hub
            .emit("restaurant_1", "orderStatusUpdate", serde_json::json!({"status": "confirmed"}))
            .unwrap();
        assert_eq!(sent, 1);

        let frame: serde_json::Value = serde_json::from_str(&rx_a.try_recv().unwrap()).unwrap();
        assert_eq!(frame["event"], "orderStatusUpdate");
        assert_eq!(frame["data"]["status"], "confirmed");
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn joining_twice_does_not_duplicate_delivery() {
        let hub = RoomHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = hub.next_connection_id();
        hub.join("user_1", conn, tx.clone());
        hub.join("user_1", conn, tx);
        assert_eq!(hub.member_count("user_1"), 1);
        hub.emit("user_1", "ping", ()).unwrap();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_subscribers_are_pruned_on_emit() {
        let hub = RoomHub::new();
        let (tx, rx) = mpsc::unbounded_channel();
        hub.join("user_1", hub.next_connection_id(), tx);
        drop(rx);
        assert_eq!(hub.emit("user_1", "ping", ()).unwrap(), 0);
        assert_eq!(hub.member_count("user_1"), 0);
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn leave_all_removes_connection_everywhere() {
        let hub = RoomHub::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (other_tx, _other_rx) = mpsc::unbounded_channel();
        let conn = hub.next_connection_id();
        let other = hub.next_connection_id();
        hub.join("user_1", conn, tx.clone());
        hub.join("restaurant_9", conn, tx);
        hub.join("restaurant_9", other, other_tx);

        hub.leave_all(conn);
        assert_eq!(hub.member_count("user_1"), 0);
        assert_eq!(hub.member_count("restaurant_9"), 1);
        assert_eq!(hub.room_count(), 1);

        hub.leave("restaurant_9", other);
        assert_eq!(hub.room_count(), 0);
    }
}
