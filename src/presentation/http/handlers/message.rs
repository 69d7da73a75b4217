//! Message History Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::HistoryQuery;
use crate::domain::Message;
use crate::shared::ChatError;
use crate::startup::AppState;

/// History query parameters
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub before: Option<DateTime<Utc>>,
}

/// Pagination info echoed back with history pages
#[derive(Debug, Serialize)]
pub struct PaginationInfo {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub has_more: bool,
}

/// History response body
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
    pub pagination: PaginationInfo,
}

/// Get paginated message history for a channel
pub async fn get_history(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ChatError> {
    let limits = &state.settings.history;
    let limit = params
        .limit
        .unwrap_or(limits.default_limit)
        .min(limits.max_limit) as usize;
    let page = params.page.unwrap_or(1).max(1);

    let result = state
        .messages
        .get_history(
            channel_id,
            HistoryQuery {
                before: params.before,
                page: params.page,
                limit,
            },
        )
        .await?;

    let has_more = match params.page {
        Some(_) => (page as usize).saturating_mul(limit) < result.total,
        None => result.messages.len() < result.total,
    };

    Ok(Json(HistoryResponse {
        pagination: PaginationInfo {
            page,
            limit: limit as u32,
            total: result.total,
            has_more,
        },
        messages: result.messages,
    }))
}
