//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the REST control panel, the websocket event stream and
//! the static overlay page under a single Axum router. The overlay page is a
//! plain HTML file that a streaming tool loads as a browser source.

pub mod controls;
pub mod ws;

use std::path::Path;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// API routes: control panel, feed snapshot and the websocket stream.
fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/controls", get(controls::get_controls).patch(controls::patch_controls))
        .route("/api/messages", post(controls::post_message))
        .route("/api/hearts", post(controls::post_heart))
        .route("/api/feed", get(controls::get_feed))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

/// Full application: API routes plus the overlay page served at `/`.
pub fn app(state: AppState, overlay_dir: &Path) -> Router {
    let overlay = ServeDir::new(overlay_dir).append_index_html_on_directories(true);

    api_routes(state)
        .fallback_service(overlay)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
