//! Channel entity.
//!
//! A channel is a named, permissioned sub-space of a community. Membership,
//! moderator status and the per-action grant table live on the channel
//! itself; a user's role is derived from those sets on every check.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ChannelPermissions, Role};
use crate::domain::{ChannelId, CommunityId, UserId};

/// Channel types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// A general-purpose text channel
    #[default]
    General,
    /// Announcement channel (typically post-restricted)
    Announcements,
    /// A voice channel
    Voice,
    /// An invite-only channel
    Private,
    /// A direct message between users
    Dm,
}

impl ChannelType {
    /// Convert from wire string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "general" => Self::General,
            "announcements" => Self::Announcements,
            "voice" => Self::Voice,
            "private" => Self::Private,
            "dm" => Self::Dm,
            _ => Self::General,
        }
    }

    /// Convert to wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Announcements => "announcements",
            Self::Voice => "voice",
            Self::Private => "private",
            Self::Dm => "dm",
        }
    }

    /// Check if this is a direct-message channel.
    pub fn is_dm(&self) -> bool {
        matches!(self, Self::Dm)
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-channel behavior settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    pub allow_file_upload: bool,
    pub allow_reactions: bool,
    pub allow_mentions: bool,
    /// Minimum seconds between successive messages from the same user
    pub slow_mode_seconds: u32,
    /// Maximum message content length in characters
    pub max_message_length: usize,
    /// Auto-expire messages after this many minutes (0 = never)
    pub auto_delete_minutes: u32,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            allow_file_upload: true,
            allow_reactions: true,
            allow_mentions: true,
            slow_mode_seconds: 0,
            max_message_length: 2000,
            auto_delete_minutes: 0,
        }
    }
}

/// Partial settings update, merged over the current values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelSettingsPatch {
    pub allow_file_upload: Option<bool>,
    pub allow_reactions: Option<bool>,
    pub allow_mentions: Option<bool>,
    pub slow_mode_seconds: Option<u32>,
    pub max_message_length: Option<usize>,
    pub auto_delete_minutes: Option<u32>,
}

impl ChannelSettings {
    /// Merge a patch over these settings, returning the result.
    pub fn merged(&self, patch: &ChannelSettingsPatch) -> Self {
        Self {
            allow_file_upload: patch.allow_file_upload.unwrap_or(self.allow_file_upload),
            allow_reactions: patch.allow_reactions.unwrap_or(self.allow_reactions),
            allow_mentions: patch.allow_mentions.unwrap_or(self.allow_mentions),
            slow_mode_seconds: patch.slow_mode_seconds.unwrap_or(self.slow_mode_seconds),
            max_message_length: patch.max_message_length.unwrap_or(self.max_message_length),
            auto_delete_minutes: patch.auto_delete_minutes.unwrap_or(self.auto_delete_minutes),
        }
    }
}

/// Represents a channel in a community.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Snowflake ID
    pub id: ChannelId,

    /// Community this channel belongs to
    pub community_id: CommunityId,

    /// Channel name (1-100 characters)
    pub name: String,

    /// Channel description
    pub description: Option<String>,

    /// Channel type
    #[serde(rename = "type")]
    pub channel_type: ChannelType,

    /// Whether the channel is invite-only
    pub is_private: bool,

    /// Member user IDs
    pub members: HashSet<UserId>,

    /// Moderator user IDs (always a subset of members)
    pub moderators: HashSet<UserId>,

    /// Per-action permission grants
    pub permissions: ChannelPermissions,

    /// Behavior settings
    pub settings: ChannelSettings,

    /// Channel creation timestamp
    pub created_at: DateTime<Utc>,

    /// Creator user ID
    pub created_by: UserId,
}

impl Channel {
    /// Derive the role a user holds in this channel.
    ///
    /// Moderator status takes precedence; a non-member has no role.
    pub fn role_of(&self, user_id: &str) -> Option<Role> {
        if self.moderators.contains(user_id) {
            Some(Role::Moderator)
        } else if self.members.contains(user_id) {
            Some(Role::Member)
        } else {
            None
        }
    }

    /// Check if a user is a member.
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }
}
