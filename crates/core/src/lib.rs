//! Domain types and rules shared by the database, event, and API crates.
//!
//! Nothing in here touches I/O. Guards and transitions operate on values that
//! the caller has already loaded.

pub mod accounts;
pub mod calendar_access;
pub mod error;
pub mod event_category;
pub mod holiday;
pub mod notification_kinds;
pub mod realtime;
pub mod types;
