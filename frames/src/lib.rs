//! Shared frame model and JSON codec for the overlay event stream.
//!
//! This crate owns the wire representation used by both `server` and `cli`.
//! Frames travel as websocket text messages so the browser overlay can read
//! them with nothing more than `JSON.parse`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// SYSCALLS
// =============================================================================

/// Sent once by the server right after the websocket upgrade.
pub const SESSION_CONNECTED: &str = "session:connected";
/// Full view of the feed: visible entries, live hearts, controls.
pub const FEED_SNAPSHOT: &str = "feed:snapshot";
/// One chat entry appended to the feed.
pub const CHAT_ENTRY: &str = "chat:entry";
/// Client request: submit a manual chat message.
pub const CHAT_SEND: &str = "chat:send";
/// A heart animation started.
pub const HEART_SPAWN: &str = "heart:spawn";
/// A heart animation finished and should be removed.
pub const HEART_EXPIRE: &str = "heart:expire";
/// Client request: throw a heart.
pub const HEART_SEND: &str = "heart:send";
/// Client request: change cadence, heart cadence or mood.
pub const CONTROL_UPDATE: &str = "control:update";
/// Control panel parameters changed.
pub const CONTROL_CHANGED: &str = "control:changed";

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text could not be parsed as a JSON frame.
    #[error("failed to decode json frame: {0}")]
    Decode(#[from] serde_json::Error),
    /// The frame parsed but its payload is not a JSON object.
    #[error("frame data must be an object, got {0}")]
    InvalidData(&'static str),
}

/// Lifecycle status of a frame in a request/response exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Request sent by a client, or an unsolicited server event.
    Request,
    /// Successful terminal response.
    Done,
    /// Error terminal response.
    Error,
}

impl Status {
    /// Terminal statuses end a response stream.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// A single message on the overlay wire protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique identifier for this frame (UUID string).
    pub id: String,
    /// ID of the request frame this is responding to, if any.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Milliseconds since the Unix epoch when the frame was created.
    #[serde(default)]
    pub ts: i64,
    /// Sender identifier (client ID or system label).
    #[serde(default)]
    pub from: Option<String>,
    /// Namespaced operation name, e.g. `"chat:entry"`.
    pub syscall: String,
    /// Lifecycle position of the frame.
    pub status: Status,
    /// JSON object payload.
    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Frame {
    /// String field from `data`, if present.
    #[must_use]
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Encode a frame as a JSON text message.
#[must_use]
pub fn encode_frame(frame: &Frame) -> String {
    // Serializing a tree of owned strings and `Value`s cannot fail.
    serde_json::to_string(frame).unwrap_or_default()
}

/// Decode a JSON text message into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed JSON or missing fields and
/// [`CodecError::InvalidData`] when `data` is not an object.
pub fn decode_frame(text: &str) -> Result<Frame, CodecError> {
    let frame: Frame = serde_json::from_str(text)?;
    match &frame.data {
        Value::Object(_) => Ok(frame),
        Value::Null => Ok(Frame { data: empty_object(), ..frame }),
        Value::Array(_) => Err(CodecError::InvalidData("array")),
        Value::String(_) => Err(CodecError::InvalidData("string")),
        Value::Number(_) => Err(CodecError::InvalidData("number")),
        Value::Bool(_) => Err(CodecError::InvalidData("bool")),
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
