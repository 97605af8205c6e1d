//! Realtime gateway message protocol.
//!
//! Frames are JSON objects with an internally-tagged `"type"` discriminator so
//! the frontend can route them by type string. Chat and calendar rooms are
//! keyed by opaque strings; [`RoomKey`] namespaces them so the two kinds never
//! collide.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// Frames a connected client may send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Announce presence. Registers this connection as the user's live one.
    UserOnline,
    JoinChat { chat_id: String },
    LeaveChat { chat_id: String },
    JoinCalendar { calendar_id: DbId },
    LeaveCalendar { calendar_id: DbId },
    Typing { chat_id: String },
    StopTyping { chat_id: String },
    NewMessage { chat_id: String, content: String },
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Frames the server pushes to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    OnlineUsers {
        user_ids: Vec<DbId>,
    },
    Typing {
        chat_id: String,
        user_id: DbId,
    },
    StopTyping {
        chat_id: String,
        user_id: DbId,
    },
    NewMessage {
        chat_id: String,
        sender_id: DbId,
        content: String,
        sent_at: Timestamp,
    },
    /// A persisted notification record, serialized as stored.
    Notification {
        notification: serde_json::Value,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    /// Serialize to the JSON text sent over the wire.
    pub fn to_json(&self) -> String {
        // Every variant holds plain data, so serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// A broadcast group a connection can join.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomKey {
    Chat(String),
    Calendar(DbId),
}

impl std::fmt::Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomKey::Chat(id) => write!(f, "chat:{id}"),
            RoomKey::Calendar(id) => write!(f, "calendar:{id}"),
        }
    }
}

/// Stable chat id for a one-to-one conversation, independent of argument order.
pub fn direct_chat_id(a: DbId, b: DbId) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("dm-{low}-{high}")
}

/// The two participants of a direct chat id, or `None` for any other chat.
pub fn direct_chat_participants(chat_id: &str) -> Option<(DbId, DbId)> {
    let (a, b) = chat_id.strip_prefix("dm-")?.split_once('-')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

/// Direct chats admit only their two participants; other rooms are open.
pub fn may_join_chat(chat_id: &str, user_id: DbId) -> bool {
    match direct_chat_participants(chat_id) {
        Some((a, b)) => user_id == a || user_id == b,
        None => !chat_id.starts_with("dm-"),
    }
}

/// Longest chat message accepted for relay.
pub const MAX_MESSAGE_LENGTH: usize = 4000;
