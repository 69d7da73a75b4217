//! Presence Snapshot Handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::domain::Session;
use crate::startup::AppState;

/// Get the online users of a community
pub async fn online_users(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> Json<Vec<Session>> {
    Json(state.sessions.online_users(&community_id))
}
