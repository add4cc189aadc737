//! HTTP surface for the chat service.
//!
//! Route contract: business success is always 200, caught engine
//! failures are 500 with `{"status":"error","message":...}`. Pipeline
//! failures never appear here at all; the finisher resolves them before
//! this layer sees the text.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::engine::Engine;
use crate::finisher::ResponseFinisher;
use crate::ui;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn Engine>,
    pub finisher: Arc<ResponseFinisher>,
    /// Path handed verbatim to the engine's save/load.
    pub state_file: String,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::chat_page))
        .route("/api/chat", post(handle_chat))
        .route("/api/save", post(handle_save))
        .route("/api/load", post(handle_load))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(state: AppState, addr: &str) -> anyhow::Result<()> {
    let router = app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "chat API listening");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn handle_chat(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let message = extract_message(&body);

    match state.engine.generate(&message).await {
        Ok(raw) => {
            let finished = state.finisher.finish(&raw).await;
            (
                StatusCode::OK,
                Json(json!({ "status": "ok", "response": finished })),
            )
        }
        Err(e) => {
            warn!(error = %e, "generation engine failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
        }
    }
}

async fn handle_save(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.save(&state.state_file).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "saved" }))),
        Err(e) => {
            warn!(error = %e, "engine save failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
        }
    }
}

async fn handle_load(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.load(&state.state_file).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "loaded" }))),
        Err(e) => {
            warn!(error = %e, "engine load failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
        }
    }
}

/// Best-effort extraction of the `message` field. Anything that is not a
/// JSON object with a string `message` is treated as an empty message,
/// never as a client error.
fn extract_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_default()
}
