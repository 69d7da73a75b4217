//! Channel Store
//!
//! Arena of channel definitions: membership, moderator sets, per-action
//! permission grants and behavior settings. This component exclusively owns
//! membership and permission mutation; other components only read through
//! its methods.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use crate::domain::{
    Channel, ChannelAction, ChannelId, ChannelPermissions, ChannelSettings, ChannelSettingsPatch,
    ChannelType, CommunityId, UserId,
};
use crate::shared::{ChatError, SnowflakeGenerator};

/// Channel creation parameters.
#[derive(Debug, Clone)]
pub struct CreateChannel {
    pub community_id: CommunityId,
    pub name: String,
    pub description: Option<String>,
    pub channel_type: ChannelType,
    pub is_private: bool,
    pub initial_members: Vec<UserId>,
    pub settings: ChannelSettingsPatch,
    pub created_by: UserId,
}

/// In-memory channel arena.
pub struct ChannelStore {
    channels: DashMap<ChannelId, Channel>,
    ids: Arc<SnowflakeGenerator>,
}

impl ChannelStore {
    pub fn new(ids: Arc<SnowflakeGenerator>) -> Self {
        Self {
            channels: DashMap::new(),
            ids,
        }
    }

    /// Create a channel.
    ///
    /// The creator always ends up both a member and a moderator; settings are
    /// merged over the documented defaults; the default grant table applies.
    pub fn create_channel(&self, request: CreateChannel) -> Channel {
        let mut members: HashSet<UserId> = request.initial_members.into_iter().collect();
        members.insert(request.created_by.clone());

        let channel = Channel {
            id: self.ids.generate(),
            community_id: request.community_id,
            name: request.name,
            description: request.description,
            channel_type: request.channel_type,
            is_private: request.is_private,
            members,
            moderators: HashSet::from([request.created_by.clone()]),
            permissions: ChannelPermissions::defaults(),
            settings: ChannelSettings::default().merged(&request.settings),
            created_at: Utc::now(),
            created_by: request.created_by,
        };

        tracing::info!(
            channel_id = channel.id,
            community_id = %channel.community_id,
            name = %channel.name,
            "Channel created"
        );

        self.channels.insert(channel.id, channel.clone());
        channel
    }

    /// Get a snapshot of a channel.
    pub fn get(&self, channel_id: ChannelId) -> Result<Channel, ChatError> {
        self.channels
            .get(&channel_id)
            .map(|c| c.clone())
            .ok_or_else(|| ChatError::NotFound("Channel not found".into()))
    }

    /// Get a channel's settings snapshot.
    pub fn settings(&self, channel_id: ChannelId) -> Result<ChannelSettings, ChatError> {
        self.channels
            .get(&channel_id)
            .map(|c| c.settings.clone())
            .ok_or_else(|| ChatError::NotFound("Channel not found".into()))
    }

    /// Get a channel's current member list.
    pub fn members(&self, channel_id: ChannelId) -> Result<Vec<UserId>, ChatError> {
        self.channels
            .get(&channel_id)
            .map(|c| c.members.iter().cloned().collect())
            .ok_or_else(|| ChatError::NotFound("Channel not found".into()))
    }

    /// Evaluate whether a user may perform an action in a channel.
    ///
    /// The user's role is derived from the channel's moderator and member
    /// sets; a non-member never has any permission regardless of the grant
    /// table. Channel-level authorization is independent of any platform
    /// admin role.
    pub fn has_permission(
        &self,
        user_id: &str,
        channel_id: ChannelId,
        action: ChannelAction,
    ) -> Result<bool, ChatError> {
        let channel = self
            .channels
            .get(&channel_id)
            .ok_or_else(|| ChatError::NotFound("Channel not found".into()))?;
        Ok(channel.permissions.allows(action, channel.role_of(user_id)))
    }

    /// Add a user to a channel. Joining twice is a no-op.
    pub fn join(&self, channel_id: ChannelId, user_id: &str) -> Result<(), ChatError> {
        let mut channel = self
            .channels
            .get_mut(&channel_id)
            .ok_or_else(|| ChatError::NotFound("Channel not found".into()))?;
        if channel.members.insert(user_id.to_string()) {
            tracing::debug!(channel_id, user_id = %user_id, "User joined channel");
        }
        Ok(())
    }

    /// Remove a user from a channel. Leaving also drops moderator status so
    /// moderators stay a subset of members. Leaving twice is a no-op.
    pub fn leave(&self, channel_id: ChannelId, user_id: &str) -> Result<(), ChatError> {
        let mut channel = self
            .channels
            .get_mut(&channel_id)
            .ok_or_else(|| ChatError::NotFound("Channel not found".into()))?;
        if channel.members.remove(user_id) {
            channel.moderators.remove(user_id);
            tracing::debug!(channel_id, user_id = %user_id, "User left channel");
        }
        Ok(())
    }

    /// Update a channel's settings. Requires the `manage_channel` grant.
    pub fn update_settings(
        &self,
        channel_id: ChannelId,
        actor_id: &str,
        patch: &ChannelSettingsPatch,
    ) -> Result<Channel, ChatError> {
        let mut channel = self
            .channels
            .get_mut(&channel_id)
            .ok_or_else(|| ChatError::NotFound("Channel not found".into()))?;

        let role = channel.role_of(actor_id);
        if !channel.permissions.allows(ChannelAction::ManageChannel, role) {
            return Err(ChatError::PermissionDenied(
                "Missing manage_channel permission".into(),
            ));
        }

        channel.settings = channel.settings.merged(patch);
        tracing::info!(channel_id, actor_id = %actor_id, "Channel settings updated");
        Ok(channel.clone())
    }

    /// List all channels of a community.
    pub fn list_by_community(&self, community_id: &str) -> Vec<Channel> {
        self.channels
            .iter()
            .filter(|c| c.community_id == community_id)
            .map(|c| c.clone())
            .collect()
    }
}
