use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use axum::extract::ws::Message;
use chronos_core::realtime::{RoomKey, ServerEvent};
use chronos_core::types::DbId;
use tokio::sync::{mpsc, RwLock};

use crate::notifications::RealtimePublisher;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// User id taken from the token presented at upgrade.
    pub user_id: DbId,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<String, WsConnection>,
    /// Live connection per announced user. Last registration wins.
    online: HashMap<DbId, String>,
    rooms: HashMap<RoomKey, HashSet<String>>,
}

impl Registry {
    fn leave_all(&mut self, conn_id: &str) {
        self.rooms.retain(|_, members| {
            members.remove(conn_id);
            !members.is_empty()
        });
    }
}

/// Manages all active WebSocket connections, user presence, and rooms.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct WsManager {
    inner: RwLock<Registry>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Registry::default()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String, user_id: DbId) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
        };
        self.inner.write().await.connections.insert(conn_id, conn);
        rx
    }

    /// Remove a connection, its room memberships, and its presence entry.
    ///
    /// Returns `true` if the online-user set changed.
    pub async fn remove(&self, conn_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        inner.connections.remove(conn_id);
        inner.leave_all(conn_id);

        let before = inner.online.len();
        inner.online.retain(|_, live| live != conn_id);
        before != inner.online.len()
    }

    /// Mark `conn_id` as the live connection of `user_id`.
    ///
    /// Returns `true` if the user was not online before. A connection can
    /// only register the user it was opened for.
    pub async fn register_user(&self, user_id: DbId, conn_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        let owned = inner
            .connections
            .get(conn_id)
            .is_some_and(|conn| conn.user_id == user_id);
        if !owned {
            return false;
        }
        inner
            .online
            .insert(user_id, conn_id.to_string())
            .is_none()
    }

    /// Ids of every announced user, ascending.
    pub async fn online_users(&self) -> Vec<DbId> {
        let mut ids: Vec<DbId> = self.inner.read().await.online.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Add a connection to a room. Unknown connections are ignored.
    pub async fn join(&self, conn_id: &str, room: RoomKey) {
        let mut inner = self.inner.write().await;
        if !inner.connections.contains_key(conn_id) {
            return;
        }
        inner
            .rooms
            .entry(room)
            .or_default()
            .insert(conn_id.to_string());
    }

    /// Remove a connection from a room. Empty rooms are dropped.
    pub async fn leave(&self, conn_id: &str, room: &RoomKey) {
        let mut inner = self.inner.write().await;
        if let Some(members) = inner.rooms.get_mut(room) {
            members.remove(conn_id);
            if members.is_empty() {
                inner.rooms.remove(room);
            }
        }
    }

    /// Number of connections currently in a room.
    pub async fn room_size(&self, room: &RoomKey) -> usize {
        self.inner
            .read()
            .await
            .rooms
            .get(room)
            .map_or(0, HashSet::len)
    }

    /// Send a message to every connection in a room, optionally skipping one.
    ///
    /// Returns the number of connections the message was queued for.
    pub async fn broadcast_room(
        &self,
        room: &RoomKey,
        message: Message,
        except: Option<&str>,
    ) -> usize {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(room) else {
            return 0;
        };
        let mut count = 0;
        for conn_id in members {
            if Some(conn_id.as_str()) == except {
                continue;
            }
            if let Some(conn) = inner.connections.get(conn_id) {
                if conn.sender.send(message.clone()).is_ok() {
                    count += 1;
                }
            }
        }
        count
    }

    /// Send a message to a single connection. Returns `false` if it is gone.
    pub async fn send_to_conn(&self, conn_id: &str, message: Message) -> bool {
        match self.inner.read().await.connections.get(conn_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Send a message to the user's registered connection.
    ///
    /// Returns `false` if the user is offline.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> bool {
        let inner = self.inner.read().await;
        inner
            .online
            .get(&user_id)
            .and_then(|conn_id| inner.connections.get(conn_id))
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Connections whose send channels are closed are silently skipped
    /// (they will be cleaned up on their next receive loop iteration).
    pub async fn broadcast(&self, message: Message) {
        let inner = self.inner.read().await;
        for conn in inner.connections.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Push the current online-user list to every connection.
    pub async fn broadcast_presence(&self) {
        let frame = ServerEvent::OnlineUsers {
            user_ids: self.online_users().await,
        };
        self.broadcast(text_frame(&frame)).await;
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Send a Close frame to every connection, then clear all state.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut inner = self.inner.write().await;
        let count = inner.connections.len();
        for conn in inner.connections.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        inner.connections.clear();
        inner.online.clear();
        inner.rooms.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimePublisher for WsManager {
    async fn push_to_user(&self, user_id: DbId, event: &ServerEvent) -> bool {
        self.send_to_user(user_id, text_frame(event)).await
    }
}

/// Encode a server frame as a WebSocket text message.
pub fn text_frame(event: &ServerEvent) -> Message {
    Message::Text(event.to_json().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_type(msg: Message) -> String {
        match msg {
            Message::Text(text) => {
                let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
                value["type"].as_str().unwrap().to_string()
            }
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Presence
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn last_registration_wins() {
        let manager = WsManager::new();
        let mut rx1 = manager.add("c1".into(), 7).await;
        let mut rx2 = manager.add("c2".into(), 7).await;

        assert!(manager.register_user(7, "c1").await);
        assert!(!manager.register_user(7, "c2").await);
        assert!(manager.send_to_user(7, Message::Text("hi".into())).await);
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());

        // Dropping the superseded connection leaves presence alone.
        assert!(!manager.remove("c1").await);
        assert_eq!(manager.online_users().await, vec![7]);

        assert!(manager.remove("c2").await);
        assert!(manager.online_users().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_connection_cannot_register() {
        let manager = WsManager::new();
        assert!(!manager.register_user(1, "ghost").await);
        assert!(manager.online_users().await.is_empty());
    }

    #[tokio::test]
    async fn connection_cannot_register_another_user() {
        let manager = WsManager::new();
        let _rx = manager.add("c1".into(), 1).await;
        assert!(!manager.register_user(2, "c1").await);
        assert!(manager.online_users().await.is_empty());
    }

    #[tokio::test]
    async fn send_to_user_reaches_only_registered_connection() {
        let manager = WsManager::new();
        let mut rx = manager.add("c1".into(), 3).await;

        assert!(!manager.send_to_user(3, Message::Text("hi".into())).await);
        manager.register_user(3, "c1").await;
        assert!(manager.send_to_user(3, Message::Text("hi".into())).await);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn presence_broadcast_lists_online_users() {
        let manager = WsManager::new();
        let mut rx = manager.add("c1".into(), 1).await;
        manager.register_user(1, "c1").await;

        manager.broadcast_presence().await;
        assert_eq!(frame_type(rx.try_recv().unwrap()), "online_users");
    }

    // -----------------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn room_broadcast_skips_sender() {
        let manager = WsManager::new();
        let mut rx_a = manager.add("a".into(), 1).await;
        let mut rx_b = manager.add("b".into(), 2).await;
        let room = RoomKey::Chat("dm-1-2".into());
        manager.join("a", room.clone()).await;
        manager.join("b", room.clone()).await;

        let sent = manager
            .broadcast_room(&room, Message::Text("x".into()), Some("a"))
            .await;

        assert_eq!(sent, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn leaving_last_member_drops_room() {
        let manager = WsManager::new();
        let _rx = manager.add("a".into(), 1).await;
        let room = RoomKey::Calendar(5);
        manager.join("a", room.clone()).await;
        assert_eq!(manager.room_size(&room).await, 1);

        manager.leave("a", &room).await;
        assert_eq!(manager.room_size(&room).await, 0);
    }

    #[tokio::test]
    async fn disconnect_leaves_all_rooms() {
        let manager = WsManager::new();
        let _rx = manager.add("a".into(), 1).await;
        manager.join("a", RoomKey::Chat("x".into())).await;
        manager.join("a", RoomKey::Calendar(9)).await;

        manager.remove("a").await;
        assert_eq!(manager.room_size(&RoomKey::Chat("x".into())).await, 0);
        assert_eq!(manager.room_size(&RoomKey::Calendar(9)).await, 0);
    }

    #[tokio::test]
    async fn shutdown_sends_close_and_clears() {
        let manager = WsManager::new();
        let mut rx = manager.add("a".into(), 1).await;
        manager.register_user(1, "a").await;

        manager.shutdown_all().await;

        assert!(matches!(rx.try_recv(), Ok(Message::Close(None))));
        assert_eq!(manager.connection_count().await, 0);
        assert!(manager.online_users().await.is_empty());
    }

    #[tokio::test]
    async fn publisher_pushes_notification_frame() {
        let manager = WsManager::new();
        let mut rx = manager.add("a".into(), 4).await;
        let event = ServerEvent::Notification {
            notification: serde_json::json!({"id": 1}),
        };

        assert!(!manager.push_to_user(4, &event).await);
        manager.register_user(4, "a").await;
        assert!(manager.push_to_user(4, &event).await);
        assert_eq!(frame_type(rx.try_recv().unwrap()), "notification");
    }
}
