pub mod auth;
pub mod calendar;
pub mod event;
pub mod health;
pub mod notification;
pub mod user;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws?token=                                       WebSocket
///
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/me                                         current user
///
/// /calendars                                       list, create
/// /calendars/{id}                                  get, update, delete
/// /calendars/{id}/hide                             hide (PUT)
/// /calendars/{id}/show                             show (PUT)
/// /calendars/{id}/invite                           invite by email (POST)
/// /calendars/{id}/members/update                   change role (POST)
/// /calendars/{id}/members/remove                   remove member (POST)
///
/// /events                                          list, create
/// /events/with-calendar                            list with calendar summary
/// /events/{id}                                     update, delete
/// /events/{id}/invite                              invite by email (POST)
///
/// /notifications                                   list, notify
/// /notifications/unread-count                      unread count
/// /notifications/read-all                          mark all read (POST)
/// /notifications/clear-all                         delete all (DELETE)
/// /notifications/{id}                              delete
/// /notifications/{id}/read                         mark read (POST)
///
/// /users/update                                    profile (PUT)
/// /users/change-password                           password (PUT)
/// /users/holiday-region                            holiday region (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/calendars", calendar::router())
        .nest("/events", event::router())
        .nest("/notifications", notification::router())
        .nest("/users", user::router())
}
