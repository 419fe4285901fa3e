//! HTTP Server for Status API
//!
//! Axum-based HTTP server providing status endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::metrics::metrics_handler;
use super::state::{ApiState, HealthResponse, StatusResponse};
use crate::readiness::ReadinessState;

/// Serve the status API on `port` until the task is dropped
pub async fn start_api_server(
    port: u16,
    state: ApiState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(port = port, "Starting status API server");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
///
/// Returns 200 whenever the server is up, whatever the poller state.
async fn health_handler(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        state: state.state(),
    })
}

/// Status endpoint
///
/// Returns 202 Accepted while still polling, 200 once the poller is done.
async fn status_handler(State(state): State<ApiState>) -> (StatusCode, Json<StatusResponse>) {
    let response = state.get_status_response();

    let status_code = match response.state {
        ReadinessState::Polling => StatusCode::ACCEPTED,
        ReadinessState::Ready | ReadinessState::Exhausted => StatusCode::OK,
    };

    (status_code, Json(response))
}
