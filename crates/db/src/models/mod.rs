//! Row types and DTOs, one module per table.

pub mod calendar;
pub mod event;
pub mod notification;
pub mod user;
