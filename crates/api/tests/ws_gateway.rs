//! End-to-end tests for the realtime gateway over a real socket.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use sqlx::PgPool;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the app on an ephemeral port and return its address.
async fn spawn_server(pool: PgPool) -> SocketAddr {
    let app = common::build_test_app(pool);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, token: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/api/ws?token={token}"))
        .await
        .expect("upgrade should succeed");
    client
}

async fn send(client: &mut Client, frame: serde_json::Value) {
    client.send(Message::Text(frame.to_string())).await.unwrap();
}

/// Next JSON text frame, failing after five seconds.
async fn next_frame(client: &mut Client) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("receive error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Skip frames until one of the given type arrives.
async fn next_of_type(client: &mut Client, frame_type: &str) -> serde_json::Value {
    loop {
        let frame = next_frame(client).await;
        if frame["type"] == frame_type {
            return frame;
        }
    }
}

/// Wait until the presence list contains exactly `expected`.
async fn await_presence(client: &mut Client, expected: &[i64]) {
    loop {
        let frame = next_of_type(client, "online_users").await;
        let ids: Vec<i64> = frame["user_ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        if ids == expected {
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upgrade_requires_valid_token(pool: PgPool) {
    let addr = spawn_server(pool).await;

    for url in [
        format!("ws://{addr}/api/ws"),
        format!("ws://{addr}/api/ws?token=garbage"),
    ] {
        match connect_async(url).await {
            Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
                assert_eq!(response.status(), 401);
            }
            other => panic!("expected HTTP 401 rejection, got {:?}", other.map(|_| ())),
        }
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_presence_typing_and_chat_relay(pool: PgPool) {
    let alice = common::register(common::build_test_app(pool.clone()), "alice").await;
    let bob = common::register(common::build_test_app(pool.clone()), "bob").await;
    let addr = spawn_server(pool).await;

    let mut a = connect(addr, &alice.token).await;
    let mut b = connect(addr, &bob.token).await;

    send(&mut a, serde_json::json!({ "type": "user_online" })).await;
    await_presence(&mut a, &[alice.id]).await;
    send(&mut b, serde_json::json!({ "type": "user_online" })).await;
    let mut both = vec![alice.id, bob.id];
    both.sort_unstable();
    await_presence(&mut a, &both).await;
    await_presence(&mut b, &both).await;

    let chat_id = chronos_core::realtime::direct_chat_id(alice.id, bob.id);
    send(&mut a, serde_json::json!({ "type": "join_chat", "chat_id": chat_id })).await;
    send(&mut b, serde_json::json!({ "type": "join_chat", "chat_id": chat_id })).await;

    // Joins are processed in order per connection; give bob's join a moment.
    tokio::time::sleep(Duration::from_millis(100)).await;

    send(&mut a, serde_json::json!({ "type": "typing", "chat_id": chat_id })).await;
    let frame = next_of_type(&mut b, "typing").await;
    assert_eq!(frame["user_id"], alice.id);
    assert_eq!(frame["chat_id"], chat_id.as_str());

    send(
        &mut a,
        serde_json::json!({ "type": "new_message", "chat_id": chat_id, "content": "hi bob" }),
    )
    .await;
    let frame = next_of_type(&mut b, "new_message").await;
    assert_eq!(frame["sender_id"], alice.id);
    assert_eq!(frame["content"], "hi bob");
    assert!(frame["sent_at"].is_string());

    // Alice never sees her own relay: the next message she gets is bob's reply.
    send(
        &mut b,
        serde_json::json!({ "type": "new_message", "chat_id": chat_id, "content": "hey" }),
    )
    .await;
    let frame = next_of_type(&mut a, "new_message").await;
    assert_eq!(frame["sender_id"], bob.id);

    // Disconnecting bob updates alice's presence list.
    b.close(None).await.unwrap();
    await_presence(&mut a, &[alice.id]).await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_bad_frames_and_invisible_calendar_get_error_frames(pool: PgPool) {
    let alice = common::register(common::build_test_app(pool.clone()), "alice").await;
    let bob = common::register(common::build_test_app(pool.clone()), "bob").await;
    let bob_main = chronos_db::repositories::CalendarRepo::find_main_for_owner(&pool, bob.id)
        .await
        .unwrap()
        .unwrap();
    let addr = spawn_server(pool).await;

    let mut a = connect(addr, &alice.token).await;

    a.send(Message::Text("{not json".into())).await.unwrap();
    let frame = next_of_type(&mut a, "error").await;
    assert!(frame["message"].as_str().unwrap().starts_with("Invalid message"));

    send(
        &mut a,
        serde_json::json!({ "type": "join_calendar", "calendar_id": bob_main.id }),
    )
    .await;
    let frame = next_of_type(&mut a, "error").await;
    assert!(frame["message"].as_str().unwrap().contains("not found"));

    send(
        &mut a,
        serde_json::json!({ "type": "new_message", "chat_id": "x", "content": "   " }),
    )
    .await;
    let frame = next_of_type(&mut a, "error").await;
    assert_eq!(frame["message"], "Message must not be empty");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_direct_chat_refuses_outsiders(pool: PgPool) {
    let alice = common::register(common::build_test_app(pool.clone()), "alice").await;
    let bob = common::register(common::build_test_app(pool.clone()), "bob").await;
    let carol = common::register(common::build_test_app(pool.clone()), "carol").await;
    let addr = spawn_server(pool).await;

    let mut a = connect(addr, &alice.token).await;
    let mut b = connect(addr, &bob.token).await;
    let mut c = connect(addr, &carol.token).await;

    let chat_id = chronos_core::realtime::direct_chat_id(alice.id, bob.id);
    send(&mut a, serde_json::json!({ "type": "join_chat", "chat_id": chat_id })).await;
    send(&mut b, serde_json::json!({ "type": "join_chat", "chat_id": chat_id })).await;

    send(&mut c, serde_json::json!({ "type": "join_chat", "chat_id": chat_id })).await;
    let frame = next_of_type(&mut c, "error").await;
    assert!(frame["message"].as_str().unwrap().contains("Not a participant"));

    // Carol cannot inject into the chat without joining either.
    send(
        &mut c,
        serde_json::json!({ "type": "new_message", "chat_id": chat_id, "content": "psst" }),
    )
    .await;
    next_of_type(&mut c, "error").await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    send(
        &mut a,
        serde_json::json!({ "type": "new_message", "chat_id": chat_id, "content": "private" }),
    )
    .await;
    let frame = next_of_type(&mut b, "new_message").await;
    assert_eq!(frame["sender_id"], alice.id);
    assert_eq!(frame["content"], "private");

    // Nothing from the direct chat reaches carol.
    let leaked = tokio::time::timeout(Duration::from_millis(300), async {
        loop {
            let frame = next_frame(&mut c).await;
            if frame["type"] == "new_message" {
                return frame;
            }
        }
    })
    .await;
    assert!(leaked.is_err(), "carol received a direct chat frame");
}
