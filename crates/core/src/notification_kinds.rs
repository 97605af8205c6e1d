//! Notification kind names.
//!
//! These must match the `ck_notifications_kind` check constraint in the
//! `create_notifications_table` migration.

pub const KIND_CALENDAR_INVITE: &str = "calendar_invite";
pub const KIND_CALENDAR_ROLE_CHANGED: &str = "calendar_role_changed";
pub const KIND_CALENDAR_REMOVED: &str = "calendar_removed";
pub const KIND_EVENT_INVITE: &str = "event_invite";
pub const KIND_EVENT_CREATED: &str = "event_created";
pub const KIND_EVENT_UPDATED: &str = "event_updated";
pub const KIND_EVENT_DELETED: &str = "event_deleted";
pub const KIND_EVENT_REMINDER: &str = "event_reminder";
pub const KIND_SYSTEM: &str = "system";

pub const VALID_KINDS: &[&str] = &[
    KIND_CALENDAR_INVITE,
    KIND_CALENDAR_ROLE_CHANGED,
    KIND_CALENDAR_REMOVED,
    KIND_EVENT_INVITE,
    KIND_EVENT_CREATED,
    KIND_EVENT_UPDATED,
    KIND_EVENT_DELETED,
    KIND_EVENT_REMINDER,
    KIND_SYSTEM,
];

/// Returns `true` if `kind` is a known notification kind.
pub fn is_valid_kind(kind: &str) -> bool {
    VALID_KINDS.contains(&kind)
}

/// Maximum number of notifications returned by a single listing.
pub const LIST_LIMIT: i64 = 200;
