//! Axum HTTP gateway with body limits, timeouts and optional CORS.
//!
//! - `POST /api/chat` for free-form messages
//! - `POST /api/command` for structured commands
//! - `GET /health`

mod handlers;
mod server;


pub use server::{build_app, run_gateway, run_gateway_with_listener};

use crate::dialogue::DEFAULT_SESSION;
use crate::memory::FileContext;
use crate::router::Assistant;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
}

/// `POST /api/chat` body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Optional `{ "file": path, "content": text }`
    #[serde(default)]
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `POST /api/command` body
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub args: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub response: String,
}

fn session_id(requested: Option<&str>) -> &str {
    requested
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_SESSION)
}

fn file_context(context: Option<&serde_json::Map<String, serde_json::Value>>) -> Option<FileContext> {
    let context = context?;
    let path = context.get("file")?.as_str()?.to_string();
    Some(FileContext {
        path,
        content: context
            .get("content")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}

fn arg_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) if s.contains(char::is_whitespace) => format!("\"{s}\""),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a structured command as the slash line the router parses.
///
/// `args.text` is appended verbatim; every other key becomes `--key value`.
pub fn command_line(
    command: &str,
    args: Option<&serde_json::Map<String, serde_json::Value>>,
) -> String {
    let command = command.trim();
    let mut line = if command.starts_with('/') {
        command.to_string()
    } else {
        format!("/{command}")
    };
    let Some(args) = args else {
        return line;
    };
    if let Some(text) = args.get("text") {
        let text = match text {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        line.push(' ');
        line.push_str(text.trim());
    }
    let mut flags: Vec<_> = args.iter().filter(|(k, _)| k.as_str() != "text").collect();
    flags.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in flags {
        line.push_str(&format!(" --{key} {}", arg_value(value)));
    }
    line
}
