use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite;

use super::*;
use crate::state::test_helpers;

fn request_text(syscall: &str, data: serde_json::Value) -> (Uuid, String) {
    let data: Data = serde_json::from_value(data).unwrap();
    let req = Frame::request(syscall, data);
    (req.id, frames::encode_frame(&frames::Frame::from(&req)))
}

async fn recv_broadcast(rx: &mut mpsc::Receiver<Frame>) -> Frame {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("broadcast receive timed out")
        .expect("broadcast channel closed unexpectedly")
}

// =============================================================================
// DISPATCH
// =============================================================================

#[tokio::test]
async fn invalid_json_yields_gateway_error() {
    let state = test_helpers::test_app_state();
    let replies = process_inbound_text(&state, Uuid::new_v4(), "{not json").await;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].syscall, "gateway:error");
}

#[tokio::test]
async fn unknown_prefix_is_rejected() {
    let state = test_helpers::test_app_state();
    let (id, text) = request_text("board:join", json!({}));
    let replies = process_inbound_text(&state, Uuid::new_v4(), &text).await;
    assert_eq!(replies[0].status, Status::Error);
    assert_eq!(replies[0].parent_id, Some(id));
}

#[tokio::test]
async fn control_update_replies_and_broadcasts() {
    let state = test_helpers::test_app_state();
    let (_peer, mut rx) = test_helpers::connect_client(&state).await;

    let (id, text) = request_text(frames::CONTROL_UPDATE, json!({"cadence_ms": 2000, "mood": "positive"}));
    let replies = process_inbound_text(&state, Uuid::new_v4(), &text).await;

    assert_eq!(replies.len(), 1);
    let reply = &replies[0];
    assert_eq!(reply.status, Status::Done);
    assert_eq!(reply.parent_id, Some(id));
    assert_eq!(reply.data.get("cadence_ms"), Some(&json!(2000)));
    assert_eq!(reply.data.get("mood"), Some(&json!("happy")));

    let changed = recv_broadcast(&mut rx).await;
    assert_eq!(changed.syscall, frames::CONTROL_CHANGED);
    assert_eq!(changed.data.get("mood"), Some(&json!("happy")));
}

#[tokio::test]
async fn control_update_out_of_range_returns_error_code() {
    let state = test_helpers::test_app_state();
    let (_, text) = request_text(frames::CONTROL_UPDATE, json!({"cadence_ms": 9000}));
    let replies = process_inbound_text(&state, Uuid::new_v4(), &text).await;

    assert_eq!(replies[0].status, Status::Error);
    assert_eq!(replies[0].data.get("code"), Some(&json!("E_CADENCE_RANGE")));
    assert_eq!(state.feed.lock().await.panel.controls().cadence_ms.as_ms(), 1000);
}

#[tokio::test]
async fn control_update_unknown_mood_returns_error_code() {
    let state = test_helpers::test_app_state();
    let (_, text) = request_text(frames::CONTROL_UPDATE, json!({"mood": "sleepy"}));
    let replies = process_inbound_text(&state, Uuid::new_v4(), &text).await;
    assert_eq!(replies[0].data.get("code"), Some(&json!("E_UNKNOWN_MOOD")));
}

#[tokio::test]
async fn chat_send_requires_text() {
    let state = test_helpers::test_app_state();
    let (_, text) = request_text(frames::CHAT_SEND, json!({"username": "ana"}));
    let replies = process_inbound_text(&state, Uuid::new_v4(), &text).await;
    assert_eq!(replies[0].status, Status::Error);
    assert_eq!(replies[0].data.get("message"), Some(&json!("text required")));
}

#[tokio::test]
async fn chat_send_blank_is_not_accepted() {
    let state = test_helpers::test_app_state();
    let (_peer, mut rx) = test_helpers::connect_client(&state).await;

    let (_, text) = request_text(frames::CHAT_SEND, json!({"text": "   "}));
    let replies = process_inbound_text(&state, Uuid::new_v4(), &text).await;
    assert_eq!(replies[0].status, Status::Done);
    assert_eq!(replies[0].data.get("accepted"), Some(&json!(false)));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn chat_send_broadcasts_entry_to_all_clients() {
    let state = test_helpers::test_app_state();
    let (_peer, mut rx) = test_helpers::connect_client(&state).await;

    let (_, text) = request_text(frames::CHAT_SEND, json!({"username": "ana", "text": "gg"}));
    let replies = process_inbound_text(&state, Uuid::new_v4(), &text).await;
    assert_eq!(replies[0].data.get("accepted"), Some(&json!(true)));

    let entry = recv_broadcast(&mut rx).await;
    assert_eq!(entry.syscall, frames::CHAT_ENTRY);
    assert_eq!(entry.data.get("username"), Some(&json!("ana")));
    assert_eq!(entry.data.get("message"), Some(&json!("gg")));
    assert_eq!(entry.data.get("origin"), Some(&json!("manual")));
}

#[tokio::test]
async fn heart_send_spawns_heart() {
    let state = test_helpers::test_app_state();
    let (_peer, mut rx) = test_helpers::connect_client(&state).await;

    let (_, text) = request_text(frames::HEART_SEND, json!({}));
    let replies = process_inbound_text(&state, Uuid::new_v4(), &text).await;
    assert_eq!(replies[0].status, Status::Done);

    let spawn = recv_broadcast(&mut rx).await;
    assert_eq!(spawn.syscall, frames::HEART_SPAWN);
    assert_eq!(spawn.data.get("origin"), Some(&json!("manual")));
}

// =============================================================================
// END TO END
// =============================================================================

async fn next_frame<S>(stream: &mut S) -> frames::Frame
where
    S: futures::Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        let msg = timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("ws receive timed out")
            .expect("ws stream ended")
            .expect("ws receive failed");
        if let tungstenite::Message::Text(text) = msg {
            return frames::decode_frame(text.as_str()).expect("server frame should decode");
        }
    }
}

#[tokio::test]
async fn websocket_client_receives_snapshot_then_replies() {
    let state = test_helpers::test_app_state();
    feed::submit_message(&state, Some("ana"), "first!").await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = crate::routes::app(state.clone(), std::path::Path::new("."));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/ws"))
        .await
        .expect("ws connect should succeed");

    let hello = next_frame(&mut ws).await;
    assert_eq!(hello.syscall, frames::SESSION_CONNECTED);
    assert!(hello.data_str("client_id").is_some());

    let snapshot = next_frame(&mut ws).await;
    assert_eq!(snapshot.syscall, frames::FEED_SNAPSHOT);
    let entries = snapshot.data["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["message"], "first!");
    assert_eq!(snapshot.data["controls"]["cadence_ms"], 1000);

    let (id, text) = request_text(frames::CHAT_SEND, json!({"username": "beto", "text": "hola"}));
    ws.send(tungstenite::Message::text(text)).await.unwrap();

    // The reply and the entry broadcast may arrive in either order.
    let mut saw_reply = false;
    let mut saw_entry = false;
    while !(saw_reply && saw_entry) {
        let frame = next_frame(&mut ws).await;
        if frame.parent_id.as_deref() == Some(id.to_string().as_str()) {
            assert_eq!(frame.status, frames::Status::Done);
            saw_reply = true;
        } else if frame.syscall == frames::CHAT_ENTRY {
            assert_eq!(frame.data_str("username"), Some("beto"));
            saw_entry = true;
        }
    }

    ws.close(None).await.unwrap();
    timeout(Duration::from_secs(2), async {
        while !state.clients.read().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client should be unsubscribed after close");
}
