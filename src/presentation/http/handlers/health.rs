//! Health Check Handlers

use axum::Json;
use serde_json::{json, Value};

/// Basic liveness check
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "community-chat",
    }))
}
