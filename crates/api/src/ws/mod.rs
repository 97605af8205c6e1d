//! WebSocket infrastructure for real-time communication.
//!
//! Provides the connection manager (presence and rooms) and the HTTP
//! upgrade handler used by Axum routes.

mod handler;
pub mod manager;

pub use handler::ws_handler;
pub use manager::WsManager;
