//! HTTP API module
//!
//! This module contains the WebSocket sync hub, the health endpoint and the
//! optional static asset fallback.

pub mod handlers;
pub mod responses;

use std::{path::Path, sync::Arc};
use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints.
///
/// When `static_dir` is given, unknown routes are served from it and fall back
/// to its `index.html`.
pub fn create_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler));

    let router = match static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => router,
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
