use super::AppState;
use super::handlers::{handle_chat, handle_command, handle_health};
use crate::config::GatewayConfig;
use anyhow::{Context, Result};
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Returns true when the bind address is not a loopback address.
fn is_public_bind(host: &str) -> bool {
    !matches!(
        host,
        "127.0.0.1" | "localhost" | "::1" | "[::1]" | "0:0:0:0:0:0:0:1"
    )
}

/// Bind `host:port` and serve until the process is stopped.
pub async fn run_gateway(
    host: &str,
    port: u16,
    config: &GatewayConfig,
    state: AppState,
) -> Result<()> {
    if is_public_bind(host) && !config.allow_public_bind {
        anyhow::bail!(
            "Refusing to bind to {host}: the gateway would be reachable from other machines.\n\
             Use --host 127.0.0.1 (default) or set [gateway] allow_public_bind = true in config.toml."
        );
    }

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("parse gateway bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind gateway socket")?;

    run_gateway_with_listener(listener, config, state).await
}

/// Serve on a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    config: &GatewayConfig,
    state: AppState,
) -> Result<()> {
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "gateway listening");
    println!("◆ Gateway listening on http://{local}");
    println!("  POST /api/chat     {{\"message\": \"...\"}}");
    println!("  POST /api/command  {{\"command\": \"...\", \"args\": {{...}}}}");
    println!("  GET  /health");

    let app = build_app(state, config);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("gateway shutting down");
        })
        .await
        .context("serve gateway")?;
    Ok(())
}

pub fn build_app(state: AppState, config: &GatewayConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/chat", post(handle_chat))
        .route("/api/command", post(handle_command))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ));

    if !config.cors_origins.is_empty() {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        );
    }

    app
}
