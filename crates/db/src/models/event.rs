//! Event entity model and DTOs.

use chronos_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::calendar::CalendarSummary;

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub title: String,
    pub date: Timestamp,
    /// Length in minutes.
    pub duration: i32,
    pub all_day: bool,
    pub category: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub calendar_id: Option<DbId>,
    pub creator_id: DbId,
    pub invited_from: Option<DbId>,
    pub invited_users: Vec<DbId>,
    pub invited_emails: Vec<String>,
    pub read_only: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting an event.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: String,
    pub date: Timestamp,
    pub duration: i32,
    pub all_day: bool,
    pub category: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub calendar_id: Option<DbId>,
    pub creator_id: DbId,
    pub invited_from: Option<DbId>,
    pub read_only: bool,
}

/// Request body for creating an event. The creator comes from the token.
#[derive(Debug, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub date: Timestamp,
    pub duration: Option<i32>,
    pub all_day: Option<bool>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub calendar_id: Option<DbId>,
}

/// DTO for updating an event. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub date: Option<Timestamp>,
    pub duration: Option<i32>,
    pub all_day: Option<bool>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub calendar_id: Option<DbId>,
}

/// An event with its calendar reference resolved.
#[derive(Debug, Clone, Serialize)]
pub struct EventWithCalendar {
    #[serde(flatten)]
    pub event: Event,
    pub calendar: Option<CalendarSummary>,
}
