#[path = "support/fakes.rs"]
mod fakes;

use std::net::SocketAddr;
use std::sync::Arc;

use fakes::{Harness, RecordingCalendar, RecordingEmail, ScriptedModel, email};
use serde_json::{Value, json};
use steward::config::GatewayConfig;
use steward::transport::gateway::{AppState, ChatResponse, build_app};

async fn serve(harness: Harness, config: &GatewayConfig) -> SocketAddr {
    let state = AppState {
        assistant: Arc::new(harness.assistant),
    };
    let app = build_app(state, config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn harness(reply: &str) -> Harness {
    Harness::new(
        RecordingEmail::with_inbox(vec![email(
            "em_1",
            "dana@example.com",
            "Team Meeting Request",
            "Can we meet?",
        )]),
        RecordingCalendar::default(),
        ScriptedModel::replying(reply),
    )
}

#[tokio::test]
async fn health_reports_memory_state() {
    let addr = serve(harness("hi"), &GatewayConfig::default()).await;
    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "ok", "memory": "ok" }));
}

#[tokio::test]
async fn chat_returns_the_assistant_reply() {
    let addr = serve(harness("Hello from the model."), &GatewayConfig::default()).await;
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/chat"))
        .json(&json!({ "message": "hello there" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: ChatResponse = response.json().await.unwrap();
    assert_eq!(body.response, "Hello from the model.");
}

#[tokio::test]
async fn command_endpoint_drives_the_same_sessions() {
    let addr = serve(harness("Draft."), &GatewayConfig::default()).await;
    let client = reqwest::Client::new();
    let command = |command: &str, args: Value| {
        client
            .post(format!("http://{addr}/api/command"))
            .json(&json!({ "command": command, "args": args, "session_id": "desk" }))
            .send()
    };

    let read: ChatResponse = command("email", json!({ "text": "read em_1" }))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(read.response.contains("Team Meeting Request"));

    let asked: ChatResponse = command("email", json!({ "text": "draft reply" }))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(asked.response.contains("office hours"), "{}", asked.response);
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let addr = serve(harness("hi"), &GatewayConfig::default()).await;
    let client = reqwest::Client::new();

    let missing = client
        .post(format!("http://{addr}/api/chat"))
        .json(&json!({ "text": "wrong field" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::BAD_REQUEST);

    let empty = client
        .post(format!("http://{addr}/api/command"))
        .json(&json!({ "command": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let config = GatewayConfig {
        max_body_bytes: 64,
        ..GatewayConfig::default()
    };
    let addr = serve(harness("hi"), &config).await;
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/chat"))
        .json(&json!({ "message": "x".repeat(1024) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
}
