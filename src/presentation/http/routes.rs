//! Route Configuration
//!
//! Configures the administrative HTTP surface and the gateway endpoint.

use axum::{
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Channel administration
        .route("/channels", post(handlers::channel::create_channel))
        .route(
            "/channels/{community_id}",
            get(handlers::channel::list_channels),
        )
        .route(
            "/channels/{channel_id}/settings",
            patch(handlers::channel::update_channel_settings),
        )
        // Message history
        .route("/messages/{channel_id}", get(handlers::message::get_history))
        // Presence snapshot
        .route(
            "/online-users/{community_id}",
            get(handlers::presence::online_users),
        )
        // WebSocket gateway endpoint
        .route("/gateway", get(ws_handler))
        // Health check endpoint
        .route("/health", get(handlers::health::health_check))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(logging::create_trace_layer())
        .layer(cors::create_cors_layer(&state.settings.cors))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}
