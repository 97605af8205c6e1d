//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`] and only ever touch
//! the requester's own notifications, except `POST /` which notifies someone
//! else.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chronos_core::error::CoreError;
use chronos_core::notification_kinds::is_valid_kind;
use chronos_core::types::DbId;
use chronos_db::models::notification::{CreateNotification, Notification};
use chronos_db::repositories::{NotificationRepo, UserRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response for `GET /notifications/unread-count`.
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

/// Response for the bulk endpoints.
#[derive(Debug, Serialize)]
pub struct Affected {
    pub affected: u64,
}

/// GET /api/notifications
///
/// Newest first, at most 200.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let notifications = NotificationRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: UnreadCount { count },
    }))
}

/// POST /api/notifications
///
/// Persist a notification for `user_id` and push it if they are online.
pub async fn create_notification(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateNotification>,
) -> AppResult<(StatusCode, Json<DataResponse<Notification>>)> {
    if !is_valid_kind(&input.kind) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown notification kind '{}'",
            input.kind
        ))));
    }
    if input.message.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Notification message must not be empty".into(),
        )));
    }
    UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", input.user_id))?;

    let notification = state.notifications.notify(&input).await?;
    tracing::info!(
        user_id = auth.user_id,
        recipient_id = input.user_id,
        notification_id = notification.id,
        "Notification sent"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: notification }),
    ))
}

/// POST /api/notifications/{id}/read
///
/// 204 on success, 404 if the notification is not the requester's.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let found = NotificationRepo::mark_read(&state.pool, notification_id, auth.user_id).await?;
    if !found {
        return Err(AppError::not_found("Notification", notification_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Affected>>> {
    let affected = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: Affected { affected },
    }))
}

/// DELETE /api/notifications/{id}
pub async fn delete_notification(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !NotificationRepo::delete(&state.pool, notification_id, auth.user_id).await? {
        return Err(AppError::not_found("Notification", notification_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/notifications/clear-all
pub async fn clear_all(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Affected>>> {
    let affected = NotificationRepo::delete_all_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: Affected { affected },
    }))
}
