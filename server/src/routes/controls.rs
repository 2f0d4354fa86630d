//! REST control panel: read and change parameters, submit manual events.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::feed::controls::{ControlError, ControlUpdate, Controls};
use crate::feed::entry::ChatEntry;
use crate::feed::hearts::{HeartEvent, HeartOrigin};
use crate::feed::pools::{Mood, UnknownMood};
use crate::services::feed::{self, FeedSnapshot};
use crate::state::AppState;

// =============================================================================
// BODIES
// =============================================================================

/// Control update as it arrives over the wire. Mood is kept as a string so
/// aliases (`positive`, `angry`, ...) parse the same way the env config does.
#[derive(Debug, Default, Deserialize)]
pub struct ControlsBody {
    pub cadence_ms: Option<u32>,
    pub heart_cadence_ms: Option<u32>,
    pub mood: Option<String>,
}

impl ControlsBody {
    /// # Errors
    ///
    /// Returns [`UnknownMood`] if `mood` names no pool.
    pub fn into_update(self) -> Result<ControlUpdate, UnknownMood> {
        let mood = self.mood.as_deref().map(str::parse::<Mood>).transpose()?;
        Ok(ControlUpdate { cadence_ms: self.cadence_ms, heart_cadence_ms: self.heart_cadence_ms, mood })
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub username: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<ChatEntry>,
}

// =============================================================================
// HANDLERS
// =============================================================================

pub async fn get_controls(State(state): State<AppState>) -> Json<Controls> {
    Json(state.feed.lock().await.panel.controls())
}

pub async fn patch_controls(
    State(state): State<AppState>,
    Json(body): Json<ControlsBody>,
) -> Result<Json<Controls>, StatusCode> {
    let update = body.into_update().map_err(|e| {
        warn!(error = %e, "controls: rejected update");
        StatusCode::BAD_REQUEST
    })?;
    let controls = feed::apply_update(&state, update).await.map_err(|e| {
        warn!(error = %e, "controls: rejected update");
        control_error_to_status(&e)
    })?;
    Ok(Json(controls))
}

/// Submit a manual message. Blank text is accepted with `accepted: false`.
pub async fn post_message(
    State(state): State<AppState>,
    Json(body): Json<MessageBody>,
) -> (StatusCode, Json<MessageResponse>) {
    match feed::submit_message(&state, body.username.as_deref(), &body.text).await {
        Some(entry) => (StatusCode::CREATED, Json(MessageResponse { accepted: true, entry: Some(entry) })),
        None => (StatusCode::OK, Json(MessageResponse { accepted: false, entry: None })),
    }
}

pub async fn post_heart(State(state): State<AppState>) -> (StatusCode, Json<HeartEvent>) {
    let heart = feed::throw_heart(&state, HeartOrigin::Manual).await;
    (StatusCode::CREATED, Json(heart))
}

pub async fn get_feed(State(state): State<AppState>) -> Json<FeedSnapshot> {
    Json(feed::snapshot(&state).await)
}

pub(crate) fn control_error_to_status(err: &ControlError) -> StatusCode {
    match err {
        ControlError::Cadence(_) | ControlError::HeartCadence(_) => StatusCode::BAD_REQUEST,
    }
}

#[cfg(test)]
#[path = "controls_test.rs"]
mod tests;
