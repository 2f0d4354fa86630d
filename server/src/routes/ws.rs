//! WebSocket handler: overlay event stream and panel requests.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, subscribes it to the feed and enters a
//! `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Feed events (entries, hearts, control changes) → forward to client
//!
//! Handler functions validate and call into the feed service, then return
//! an `Outcome`. Feed events caused by a request reach every client,
//! including the sender, through the feed broadcast; the sender additionally
//! gets a `done` or `error` reply correlated by `parent_id`.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id`
//! 2. Subscribe → send `feed:snapshot`
//! 3. Client sends frames → dispatch → reply to sender
//! 4. Close → unsubscribe

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::feed::hearts::HeartOrigin;
use crate::frame::{Data, Frame, Status, to_data};
use crate::routes::controls::{ControlsBody, MessageResponse};
use crate::services::feed;
use crate::state::AppState;

/// Per-connection buffer for feed events. A client that falls this far
/// behind starts missing frames rather than stalling the feed.
const CLIENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer turns it into
/// the reply frame; handlers never touch the socket.
enum Outcome {
    /// Send done+data to sender only.
    Reply(Data),
    /// Send empty done to sender only.
    Done,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(CLIENT_CHANNEL_CAPACITY);

    let welcome = Frame::request(frames::SESSION_CONNECTED, Data::new()).with_data("client_id", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    let snapshot = feed::subscribe(&state, client_id, client_tx).await;
    info!(%client_id, entries = snapshot.entries.len(), hearts = snapshot.hearts.len(), "ws: client connected");
    if send_frame(&mut socket, &Frame::event(frames::FEED_SNAPSHOT, &snapshot)).await.is_ok() {
        loop {
            tokio::select! {
                msg = socket.recv() => {
                    let Some(msg) = msg else { break };
                    let Ok(msg) = msg else { break };
                    match msg {
                        Message::Text(text) => {
                            for frame in process_inbound_text(&state, client_id, &text).await {
                                let _ = send_frame(&mut socket, &frame).await;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                Some(frame) = client_rx.recv() => {
                    if send_frame(&mut socket, &frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    feed::unsubscribe(&state, client_id).await;
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
///
/// This keeps the websocket transport concerns separate from frame handling,
/// so tests can exercise dispatch without a socket.
async fn process_inbound_text(state: &AppState, client_id: Uuid, text: &str) -> Vec<Frame> {
    let wire = match frames::decode_frame(text) {
        Ok(wire) => wire,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            return vec![gateway_error(e.to_string())];
        }
    };
    let mut req = match Frame::try_from(wire) {
        Ok(req) => req,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            return vec![gateway_error(e.to_string())];
        }
    };

    req.from = Some(client_id.to_string());
    info!(%client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");

    let prefix = req.prefix();
    let result = match prefix {
        "control" => handle_control(state, &req).await,
        "chat" => handle_chat(state, &req).await,
        "heart" => handle_heart(state, &req).await,
        "feed" => handle_feed(state, &req).await,
        _ => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Done) => vec![req.done()],
        Err(err_frame) => vec![err_frame],
    }
}

fn gateway_error(message: String) -> Frame {
    Frame::request("gateway:error", Data::new()).with_data("message", message)
}

fn op(req: &Frame) -> &str {
    req.syscall.split_once(':').map_or("", |(_, op)| op)
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn handle_control(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match op(req) {
        "update" => {
            let payload = serde_json::Value::Object(req.data.clone().into_iter().collect());
            let body: ControlsBody =
                serde_json::from_value(payload).map_err(|e| req.error(format!("invalid control update: {e}")))?;
            let update = body.into_update().map_err(|e| req.error_from(&e))?;
            let controls = feed::apply_update(state, update).await.map_err(|e| req.error_from(&e))?;
            Ok(Outcome::Reply(to_data(&controls)))
        }
        "get" => {
            let controls = state.feed.lock().await.panel.controls();
            Ok(Outcome::Reply(to_data(&controls)))
        }
        other => Err(req.error(format!("unknown control op: {other}"))),
    }
}

async fn handle_chat(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match op(req) {
        "send" => {
            let Some(text) = req.data.get("text").and_then(|v| v.as_str()) else {
                return Err(req.error("text required"));
            };
            let username = req.data.get("username").and_then(|v| v.as_str());
            let entry = feed::submit_message(state, username, text).await;
            Ok(Outcome::Reply(to_data(&MessageResponse { accepted: entry.is_some(), entry })))
        }
        other => Err(req.error(format!("unknown chat op: {other}"))),
    }
}

async fn handle_heart(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match op(req) {
        "send" => {
            let heart = feed::throw_heart(state, HeartOrigin::Manual).await;
            debug!(id = heart.id, "ws: heart thrown");
            Ok(Outcome::Done)
        }
        other => Err(req.error(format!("unknown heart op: {other}"))),
    }
}

async fn handle_feed(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match op(req) {
        "snapshot" => Ok(Outcome::Reply(to_data(&feed::snapshot(state).await))),
        other => Err(req.error(format!("unknown feed op: {other}"))),
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = frames::encode_frame(&frames::Frame::from(frame));
    if frame.status == Status::Error {
        let code = frame.data.get("code").and_then(|v| v.as_str()).unwrap_or("-");
        let message = frame.data.get("message").and_then(|v| v.as_str()).unwrap_or("-");
        warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
    } else {
        debug!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
