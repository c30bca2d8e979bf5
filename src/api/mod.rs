// src/api/mod.rs — HTTP API server

pub mod auth;
pub mod handlers;
pub mod types;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::connect::ConnectService;
use crate::model::ModelCache;
use crate::upload::UploadSessions;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<UploadSessions>,
    pub model: Arc<ModelCache>,
    pub connect: Arc<ConnectService>,
    /// Optional shared secret required from the gateway.
    pub token: Option<String>,
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/classify", post(handlers::classify))
        .route("/api/v1/uploads/chunk", post(handlers::upload_chunk))
        .route("/api/v1/uploads/assemble", post(handlers::assemble_session))
        .route("/api/v1/connect/account", post(handlers::create_connect_account))
        .route("/api/v1/connect/status", post(handlers::update_account_status))
        .route("/api/v1/connect/link", post(handlers::refresh_account_link))
        .route("/api/v1/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server on the given port (blocking).
pub async fn start_server(port: u16, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let router = build_router(state);

    tracing::info!("API server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
