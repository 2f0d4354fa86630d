//! Frame: the server-side view of the overlay wire message.
//!
//! ARCHITECTURE
//! ============
//! Every event the overlay sees is a Frame: chat entries, hearts, control
//! changes, and request/reply pairs from clients that drive the panel.
//! The wire form lives in the shared `frames` crate; this type adds typed
//! ids and a flat payload map for convenient construction.
//!
//! DESIGN
//! ======
//! - Flat data: payload is always `Map<String, Value>`.
//! - Responses correlate to requests via `parent_id`.
//! - The WS handler routes on `syscall` prefix ("chat:", "heart:", ...).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::feed::entry::now_ms;

pub use frames::Status;

// =============================================================================
// FIELD CONSTANTS
// =============================================================================

/// Frame data key for error messages.
pub const FRAME_MESSAGE: &str = "message";

/// Frame data key for grepable error codes.
pub const FRAME_CODE: &str = "code";

/// Frame data key for the retryable flag on error frames.
pub const FRAME_RETRYABLE: &str = "retryable";

// =============================================================================
// TYPES
// =============================================================================

/// Flat key-value payload. Alias to reduce noise in signatures.
pub type Data = HashMap<String, serde_json::Value>;

/// The universal message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    /// Milliseconds since Unix epoch. Set automatically at construction.
    pub ts: i64,
    pub from: Option<String>,
    pub syscall: String,
    pub status: Status,
    pub data: Data,
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error frames.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for crate::feed::controls::ControlError {
    fn error_code(&self) -> &'static str {
        "E_CADENCE_RANGE"
    }
}

impl ErrorCode for crate::feed::pools::UnknownMood {
    fn error_code(&self) -> &'static str {
        "E_UNKNOWN_MOOD"
    }
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

impl Frame {
    /// Create a request frame. Also used for unsolicited server events.
    pub fn request(syscall: impl Into<String>, data: Data) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: None,
            ts: now_ms(),
            from: None,
            syscall: syscall.into(),
            status: Status::Request,
            data,
        }
    }

    /// Build an event frame whose payload is a serializable struct's fields.
    pub fn event(syscall: impl Into<String>, payload: &impl Serialize) -> Self {
        Self::request(syscall, to_data(payload))
    }

    /// Create a done response. Terminal, carries no data.
    #[must_use]
    pub fn done(&self) -> Self {
        self.reply(Status::Done, Data::new())
    }

    /// Create a done response carrying data. Terminal.
    #[must_use]
    pub fn done_with(&self, data: Data) -> Self {
        self.reply(Status::Done, data)
    }

    /// Create an error response from a plain string. Terminal.
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> Self {
        let mut data = Data::new();
        data.insert(FRAME_MESSAGE.into(), serde_json::Value::String(message.into()));
        self.reply(Status::Error, data)
    }

    /// Create a structured error response from a typed error. Terminal.
    #[must_use]
    pub fn error_from(&self, err: &(impl ErrorCode + ?Sized)) -> Self {
        let mut data = Data::new();
        data.insert(FRAME_CODE.into(), serde_json::Value::String(err.error_code().to_string()));
        data.insert(FRAME_MESSAGE.into(), serde_json::Value::String(err.to_string()));
        data.insert(FRAME_RETRYABLE.into(), serde_json::Value::Bool(err.retryable()));
        self.reply(Status::Error, data)
    }

    /// Build a reply frame. Inherits `parent_id` and `syscall`.
    fn reply(&self, status: Status, data: Data) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: Some(self.id),
            ts: now_ms(),
            from: None,
            syscall: self.syscall.clone(),
            status,
            data,
        }
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

impl Frame {
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Flatten a serializable struct into frame data. Non-object values land
/// under a single `value` key.
pub fn to_data(payload: &impl Serialize) -> Data {
    match serde_json::to_value(payload) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        Ok(other) => Data::from([("value".to_owned(), other)]),
        Err(_) => Data::new(),
    }
}

// =============================================================================
// ROUTING
// =============================================================================

impl Frame {
    /// Extract the syscall prefix (everything before the first ':').
    #[must_use]
    pub fn prefix(&self) -> &str {
        let Some((prefix, _)) = self.syscall.split_once(':') else {
            return &self.syscall;
        };
        prefix
    }
}

// =============================================================================
// WIRE CONVERSION
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid frame id: {0}")]
    InvalidId(String),
    #[error("invalid parent id: {0}")]
    InvalidParentId(String),
}

impl From<&Frame> for frames::Frame {
    fn from(frame: &Frame) -> Self {
        Self {
            id: frame.id.to_string(),
            parent_id: frame.parent_id.map(|id| id.to_string()),
            ts: frame.ts,
            from: frame.from.clone(),
            syscall: frame.syscall.clone(),
            status: frame.status,
            data: serde_json::Value::Object(frame.data.clone().into_iter().collect()),
        }
    }
}

impl TryFrom<frames::Frame> for Frame {
    type Error = WireError;

    fn try_from(wire: frames::Frame) -> Result<Self, Self::Error> {
        let id = wire.id.parse().map_err(|_| WireError::InvalidId(wire.id.clone()))?;
        let parent_id = wire
            .parent_id
            .map(|p| p.parse().map_err(|_| WireError::InvalidParentId(p)))
            .transpose()?;
        let data = match wire.data {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => Data::new(),
        };
        Ok(Self { id, parent_id, ts: wire.ts, from: wire.from, syscall: wire.syscall, status: wire.status, data })
    }
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
