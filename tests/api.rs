//! End-to-end HTTP tests: the real router served on an ephemeral port,
//! exercised with a plain HTTP client.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use nexus_chat::backend::loader::BackendLoader;
use nexus_chat::backend::NoBackend;
use nexus_chat::engine::{Engine, ValenceEngine};
use nexus_chat::finisher::ResponseFinisher;
use nexus_chat::server::{app, AppState};

/// Echoes the user message back in the engine's raw wire format.
struct EchoEngine;

#[async_trait]
impl Engine for EchoEngine {
    async fn generate(&self, message: &str) -> Result<String> {
        Ok(format!("[NEXUS]: [positive]you said {message}"))
    }
    async fn save(&self, _path: &str) -> Result<()> {
        Ok(())
    }
    async fn load(&self, _path: &str) -> Result<()> {
        Ok(())
    }
}

struct OfflineEngine;

#[async_trait]
impl Engine for OfflineEngine {
    async fn generate(&self, _message: &str) -> Result<String> {
        Err(anyhow::anyhow!("engine offline"))
    }
    async fn save(&self, _path: &str) -> Result<()> {
        Err(anyhow::anyhow!("engine offline"))
    }
    async fn load(&self, _path: &str) -> Result<()> {
        Err(anyhow::anyhow!("engine offline"))
    }
}

fn state_for(engine: Arc<dyn Engine>, state_file: &str) -> AppState {
    let loader = Arc::new(BackendLoader::new(Arc::new(NoBackend)));
    AppState {
        engine,
        finisher: Arc::new(ResponseFinisher::new(loader)),
        state_file: state_file.to_string(),
    }
}

async fn spawn_app(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn chat_returns_finished_text() {
    let base = spawn_app(state_for(Arc::new(EchoEngine), "state.dat")).await;
    let res = reqwest::Client::new()
        .post(format!("{base}/api/chat"))
        .json(&serde_json::json!({ "message": "hi" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["response"], "You said hi.");
}

#[tokio::test]
async fn chat_escapes_awkward_characters() {
    let base = spawn_app(state_for(Arc::new(EchoEngine), "state.dat")).await;
    let res = reqwest::Client::new()
        .post(format!("{base}/api/chat"))
        .json(&serde_json::json!({ "message": "a \"quoted\"\nthing" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    let response = body["response"].as_str().unwrap();
    assert!(response.contains("\"quoted\""), "got {response:?}");
}

#[tokio::test]
async fn engine_failure_maps_to_500_error_shape() {
    let base = spawn_app(state_for(Arc::new(OfflineEngine), "state.dat")).await;
    let res = reqwest::Client::new()
        .post(format!("{base}/api/chat"))
        .json(&serde_json::json!({ "message": "hi" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "engine offline");
}

#[tokio::test]
async fn malformed_body_is_treated_as_empty_message() {
    let base = spawn_app(state_for(Arc::new(EchoEngine), "state.dat")).await;
    let res = reqwest::Client::new()
        .post(format!("{base}/api/chat"))
        .body("this is not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["response"], "You said.");
}

#[tokio::test]
async fn save_then_load_round_trips_engine_state() {
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("state.dat");
    let base = spawn_app(state_for(
        Arc::new(ValenceEngine::new()),
        state_file.to_str().unwrap(),
    ))
    .await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/api/save"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "saved");
    assert!(state_file.exists());

    let res = client
        .post(format!("{base}/api/load"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "loaded");
}

#[tokio::test]
async fn save_failure_maps_to_500_error_shape() {
    let base = spawn_app(state_for(
        Arc::new(ValenceEngine::new()),
        "/nonexistent/dir/state.dat",
    ))
    .await;
    let res = reqwest::Client::new()
        .post(format!("{base}/api/save"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn root_serves_the_chat_page() {
    let base = spawn_app(state_for(Arc::new(EchoEngine), "state.dat")).await;
    let res = reqwest::get(base).await.unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let content_type = res
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"), "got {content_type}");
    let page = res.text().await.unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
}
