use super::{AppState, ChatRequest, ChatResponse, CommandRequest, command_line, file_context, session_id};
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Token for one request; it is cancelled when the guard drops, which
/// includes axum dropping the handler after the client disconnects.
pub(super) fn request_token() -> (CancellationToken, DropGuard) {
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

fn bad_request(message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// GET /health
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let memory_ok = state.assistant.memory().health_check().await;
    Json(serde_json::json!({
        "status": "ok",
        "memory": if memory_ok { "ok" } else { "degraded" },
    }))
}

/// POST /api/chat
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(%rejection, "chat request rejected");
            return bad_request("Invalid JSON body. Expected: {\"message\": \"...\"}");
        }
    };
    if request.message.trim().is_empty() {
        return bad_request("message must not be empty");
    }

    let session = session_id(request.session_id.as_deref());
    let file = file_context(request.context.as_ref());
    let (cancel, _guard) = request_token();
    let response = state
        .assistant
        .handle(session, &request.message, file.as_ref(), &cancel)
        .await;
    Json(ChatResponse { response }).into_response()
}

/// POST /api/command
pub(super) async fn handle_command(
    State(state): State<AppState>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(%rejection, "command request rejected");
            return bad_request("Invalid JSON body. Expected: {\"command\": \"...\"}");
        }
    };
    if request.command.trim().is_empty() {
        return bad_request("command must not be empty");
    }

    let line = command_line(&request.command, request.args.as_ref());
    let session = session_id(request.session_id.as_deref());
    let (cancel, _guard) = request_token();
    let response = state.assistant.handle(session, &line, None, &cancel).await;
    Json(ChatResponse { response }).into_response()
}

#[cfg(test)]
mod tests {
    use super::request_token;

    #[tokio::test]
    async fn dropping_the_handler_cancels_its_token() {
        let (token, guard) = request_token();
        let waiter = token.clone();
        let handler = tokio::spawn(async move {
            let _guard = guard;
            std::future::pending::<()>().await;
        });
        assert!(!token.is_cancelled());

        handler.abort();
        let _ = handler.await;
        waiter.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[test]
    fn finished_request_also_releases_its_token() {
        let (token, guard) = request_token();
        drop(guard);
        assert!(token.is_cancelled());
    }
}
