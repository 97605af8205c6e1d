//! Notification entity model and DTOs.

use chronos_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub calendar_id: Option<DbId>,
    pub event_id: Option<DbId>,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for creating a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub calendar_id: Option<DbId>,
    pub event_id: Option<DbId>,
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}
