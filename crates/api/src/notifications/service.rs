use std::sync::Arc;

use async_trait::async_trait;
use chronos_core::realtime::ServerEvent;
use chronos_core::types::DbId;
use chronos_db::models::notification::{CreateNotification, Notification};
use chronos_db::repositories::NotificationRepo;
use chronos_db::DbPool;

/// Pushes a frame to a user's live connection, if they have one.
#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    /// Returns `true` if the user was online and the frame was queued.
    async fn push_to_user(&self, user_id: DbId, event: &ServerEvent) -> bool;
}

/// Persists notifications, then pushes them to online recipients.
///
/// Delivery is at-most-once: an offline recipient only sees the stored
/// record the next time they list their notifications.
pub struct NotificationService {
    pool: DbPool,
    publisher: Arc<dyn RealtimePublisher>,
}

impl NotificationService {
    pub fn new(pool: DbPool, publisher: Arc<dyn RealtimePublisher>) -> Self {
        Self { pool, publisher }
    }

    /// Store the notification and push it to the recipient's connection.
    pub async fn notify(&self, input: &CreateNotification) -> Result<Notification, sqlx::Error> {
        let notification = NotificationRepo::create(&self.pool, input).await?;

        let payload = match serde_json::to_value(&notification) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, notification_id = notification.id, "Failed to encode notification");
                return Ok(notification);
            }
        };

        let pushed = self
            .publisher
            .push_to_user(
                notification.user_id,
                &ServerEvent::Notification {
                    notification: payload,
                },
            )
            .await;

        tracing::debug!(
            notification_id = notification.id,
            user_id = notification.user_id,
            kind = %notification.kind,
            pushed,
            "Notification stored"
        );
        Ok(notification)
    }

    /// [`notify`](Self::notify) for side-effect notifications.
    ///
    /// Failures are logged and swallowed so the triggering request still
    /// succeeds.
    pub async fn notify_best_effort(&self, input: CreateNotification) {
        if let Err(e) = self.notify(&input).await {
            tracing::warn!(
                error = %e,
                user_id = input.user_id,
                kind = %input.kind,
                "Failed to deliver notification"
            );
        }
    }
}
