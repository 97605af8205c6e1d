//! Notification persistence and realtime delivery.
//!
//! [`NotificationService`] stores a notification and then hands it to a
//! [`RealtimePublisher`] so an online recipient sees it immediately.

pub mod service;

pub use service::{NotificationService, RealtimePublisher};
