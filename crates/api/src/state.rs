use std::sync::Arc;

use chronos_events::{EmailDelivery, HolidaySource};

use crate::config::ServerConfig;
use crate::notifications::{NotificationService, RealtimePublisher};
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: chronos_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Realtime connection manager (presence, rooms, per-user push).
    pub ws_manager: Arc<WsManager>,
    /// Persists notifications and pushes them to online recipients.
    pub notifications: Arc<NotificationService>,
    /// Public-holiday feed used by the holiday-calendar bootstrap.
    pub holidays: Arc<dyn HolidaySource>,
    /// Invitation mailer; `None` when SMTP is not configured.
    pub mailer: Option<Arc<EmailDelivery>>,
}

impl AppState {
    /// Wire the realtime manager and notification service around a pool.
    pub fn new(
        pool: chronos_db::DbPool,
        config: ServerConfig,
        holidays: Arc<dyn HolidaySource>,
        mailer: Option<Arc<EmailDelivery>>,
    ) -> Self {
        let ws_manager = Arc::new(WsManager::new());
        let notifications = Arc::new(NotificationService::new(
            pool.clone(),
            Arc::clone(&ws_manager) as Arc<dyn RealtimePublisher>,
        ));
        Self {
            pool,
            config: Arc::new(config),
            ws_manager,
            notifications,
            holidays,
            mailer,
        }
    }
}
