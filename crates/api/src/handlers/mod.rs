pub mod auth;
pub mod calendar;
pub mod event;
pub mod notification;
pub mod user;
