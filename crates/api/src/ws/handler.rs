use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use chronos_core::error::CoreError;
use chronos_core::realtime::{may_join_chat, ClientEvent, RoomKey, ServerEvent, MAX_MESSAGE_LENGTH};
use chronos_core::types::DbId;
use chronos_db::repositories::CalendarRepo;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws::manager::text_frame;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// HTTP handler that authenticates the `token` query parameter and upgrades
/// the connection to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> AppResult<Response> {
    let token = params.token.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Missing token query parameter".into()))
    })?;
    let claims = validate_token(&token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    let user_id = claims.sub;
    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, user_id))
        .into_response())
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Dispatches inbound frames on the current task.
///   4. Cleans up on disconnect and re-broadcasts presence if it changed.
async fn handle_socket(socket: WebSocket, state: AppState, user_id: DbId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let mut rx = state.ws_manager.add(conn_id.clone(), user_id).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Text(text)) => {
                let session = Session {
                    state: &state,
                    conn_id: &conn_id,
                    user_id,
                };
                match serde_json::from_str::<ClientEvent>(text.as_str()) {
                    Ok(event) => session.dispatch(event).await,
                    Err(e) => {
                        tracing::debug!(conn_id = %conn_id, error = %e, "Unparseable frame");
                        session.reply_error(format!("Invalid message: {e}")).await;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    if state.ws_manager.remove(&conn_id).await {
        state.ws_manager.broadcast_presence().await;
    }
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket disconnected");
}

/// One connection's view of the gateway while handling a frame.
struct Session<'a> {
    state: &'a AppState,
    conn_id: &'a str,
    user_id: DbId,
}

impl Session<'_> {
    async fn dispatch(&self, event: ClientEvent) {
        let manager = &self.state.ws_manager;
        match event {
            ClientEvent::UserOnline => {
                manager.register_user(self.user_id, self.conn_id).await;
                manager.broadcast_presence().await;
            }
            ClientEvent::JoinChat { chat_id } => {
                self.join_chat(chat_id).await;
            }
            ClientEvent::LeaveChat { chat_id } => {
                manager.leave(self.conn_id, &RoomKey::Chat(chat_id)).await;
            }
            ClientEvent::JoinCalendar { calendar_id } => {
                self.join_calendar(calendar_id).await;
            }
            ClientEvent::LeaveCalendar { calendar_id } => {
                manager
                    .leave(self.conn_id, &RoomKey::Calendar(calendar_id))
                    .await;
            }
            ClientEvent::Typing { chat_id } => {
                let frame = ServerEvent::Typing {
                    chat_id: chat_id.clone(),
                    user_id: self.user_id,
                };
                self.relay(chat_id, &frame).await;
            }
            ClientEvent::StopTyping { chat_id } => {
                let frame = ServerEvent::StopTyping {
                    chat_id: chat_id.clone(),
                    user_id: self.user_id,
                };
                self.relay(chat_id, &frame).await;
            }
            ClientEvent::NewMessage { chat_id, content } => {
                if content.trim().is_empty() {
                    self.reply_error("Message must not be empty".into()).await;
                    return;
                }
                if content.chars().count() > MAX_MESSAGE_LENGTH {
                    self.reply_error(format!(
                        "Message exceeds {MAX_MESSAGE_LENGTH} characters"
                    ))
                    .await;
                    return;
                }
                let frame = ServerEvent::NewMessage {
                    chat_id: chat_id.clone(),
                    sender_id: self.user_id,
                    content,
                    sent_at: chrono::Utc::now(),
                };
                self.relay(chat_id, &frame).await;
            }
        }
    }

    async fn join_calendar(&self, calendar_id: DbId) {
        let visible = match CalendarRepo::find_by_id(&self.state.pool, calendar_id).await {
            Ok(Some(calendar)) => calendar.access().can_view(self.user_id),
            Ok(None) => false,
            Err(e) => {
                tracing::error!(error = %e, calendar_id, "Failed to load calendar for join");
                false
            }
        };

        if visible {
            self.join_room(RoomKey::Calendar(calendar_id)).await;
        } else {
            self.reply_error(format!("Calendar {calendar_id} not found"))
                .await;
        }
    }

    async fn join_chat(&self, chat_id: String) {
        if !may_join_chat(&chat_id, self.user_id) {
            self.reply_error(format!("Not a participant of chat {chat_id}"))
                .await;
            return;
        }
        self.join_room(RoomKey::Chat(chat_id)).await;
    }

    async fn join_room(&self, room: RoomKey) {
        let manager = &self.state.ws_manager;
        manager.join(self.conn_id, room.clone()).await;
        let members = manager.room_size(&room).await;
        tracing::debug!(conn_id = %self.conn_id, room = %room, members, "Joined room");
    }

    /// Send a frame to every other connection in the chat room.
    ///
    /// Outsiders of a direct chat get an error frame instead.
    async fn relay(&self, chat_id: String, frame: &ServerEvent) {
        if !may_join_chat(&chat_id, self.user_id) {
            self.reply_error(format!("Not a participant of chat {chat_id}"))
                .await;
            return;
        }
        let delivered = self
            .state
            .ws_manager
            .broadcast_room(&RoomKey::Chat(chat_id), text_frame(frame), Some(self.conn_id))
            .await;
        tracing::trace!(conn_id = %self.conn_id, delivered, "Relayed chat frame");
    }

    async fn reply_error(&self, message: String) {
        self.state
            .ws_manager
            .send_to_conn(self.conn_id, text_frame(&ServerEvent::Error { message }))
            .await;
    }
}
