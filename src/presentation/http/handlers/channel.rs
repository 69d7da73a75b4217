//! Channel Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::application::services::CreateChannel;
use crate::domain::{Channel, ChannelSettingsPatch, ChannelType, UserId};
use crate::shared::ChatError;
use crate::startup::AppState;

/// Create channel request body
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChannelRequest {
    #[validate(length(min = 1))]
    pub community_id: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub channel_type: ChannelType,

    #[serde(default)]
    pub is_private: bool,

    #[serde(default)]
    pub members: Vec<UserId>,

    #[serde(default)]
    pub settings: ChannelSettingsPatch,

    #[validate(length(min = 1))]
    pub created_by: UserId,
}

/// Update channel settings request body
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateChannelSettingsRequest {
    #[validate(length(min = 1))]
    pub updated_by: UserId,

    pub settings: ChannelSettingsPatch,
}

/// Create a new channel
pub async fn create_channel(
    State(state): State<AppState>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<Channel>), ChatError> {
    body.validate()
        .map_err(|e| ChatError::Validation(e.to_string()))?;

    let channel = state.channels.create_channel(CreateChannel {
        community_id: body.community_id,
        name: body.name,
        description: body.description,
        channel_type: body.channel_type,
        is_private: body.is_private,
        initial_members: body.members,
        settings: body.settings,
        created_by: body.created_by,
    });

    Ok((StatusCode::CREATED, Json(channel)))
}

/// List channels of a community
pub async fn list_channels(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> Json<Vec<Channel>> {
    Json(state.channels.list_by_community(&community_id))
}

/// Update channel settings (requires manage_channel)
pub async fn update_channel_settings(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
    Json(body): Json<UpdateChannelSettingsRequest>,
) -> Result<Json<Channel>, ChatError> {
    body.validate()
        .map_err(|e| ChatError::Validation(e.to_string()))?;

    let channel = state
        .channels
        .update_settings(channel_id, &body.updated_by, &body.settings)?;

    Ok(Json(channel))
}
