//! Semantic Bridge HTTP host
//!
//! Same coordinator wiring as `bridge-host`, exposed over HTTP for manual
//! testing from a browser or curl.
//!
//! # Endpoints
//!
//! - `GET /health` - liveness
//! - `GET /api/status` - shorthand for `GET_MODEL_STATUS`
//! - `POST /api/message` - body is one control message, reply is its JSON result
//!
//! ```bash
//! curl -X POST http://127.0.0.1:3200/api/message \
//!   -d '{"type": "SWITCH_SEMANTIC_MODEL", "modelPreset": "bge-small-en-v1.5"}'
//! ```
//!
//! Port from `BRIDGE_HTTP_PORT`, default 3200.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use semantic_bridge_core::bridge::{dispatch, handle_line, BridgeResponse, ControlMessage};
use semantic_bridge_core::ModelLifecycleCoordinator;
use semantic_bridge_dev_tools::{BridgeHost, HostConfig};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    coordinator: Arc<ModelLifecycleCoordinator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("bridge_http=debug,semantic_bridge_core=debug")
            }),
        )
        .init();

    println!("🔧 Initializing bridge-http...");

    let config = HostConfig::from_env()?;
    let host = BridgeHost::build(&config)?;
    host.start_default_engine();
    println!("✅ Coordinator initialized");

    let state = AppState {
        coordinator: host.coordinator.clone(),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(get_status))
        .route("/api/message", post(post_message))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = format!("127.0.0.1:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        eprintln!("❌ Failed to bind to {}: {}", addr, e);
        eprintln!("   Another process may be using this port.");
        eprintln!("   Check with: lsof -i :{}", config.http_port);
        e
    })?;

    println!("\n🚀 Bridge HTTP server started!");
    println!("   Listening on: http://{}", addr);
    println!("   State file: {}", config.state_path.display());
    println!("   Worker: {}\n", config.worker_bin.display());

    let result = axum::serve(listener, app).await;
    host.shutdown().await;
    result?;

    Ok(())
}

// === Handler Functions ===

async fn health_check() -> &'static str {
    "OK"
}

async fn get_status(State(state): State<AppState>) -> Json<BridgeResponse> {
    Json(dispatch(&state.coordinator, ControlMessage::GetModelStatus).await)
}

/// Failures are reported in the body with `success: false`, always HTTP 200
async fn post_message(State(state): State<AppState>, body: String) -> Json<BridgeResponse> {
    Json(handle_line(&state.coordinator, &body).await)
}
