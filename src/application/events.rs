//! Event protocol.
//!
//! Client and server events exchanged over a persistent connection. The
//! framing is transport-agnostic: events are adjacently tagged JSON with an
//! `event` name and a `data` payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ChannelId, CommunityId, Message, MessageId, MessageType, PresenceStatus, ReactionMap, UserId,
};

/// Events a client may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Authenticate {
        user_id: UserId,
        username: String,
        #[serde(default)]
        avatar: Option<String>,
    },
    JoinCommunity {
        community_id: CommunityId,
    },
    JoinChannel {
        channel_id: ChannelId,
    },
    SendMessage {
        #[serde(default)]
        community_id: Option<CommunityId>,
        channel_id: ChannelId,
        content: String,
        #[serde(rename = "type", default)]
        message_type: MessageType,
        #[serde(default)]
        metadata: serde_json::Value,
        #[serde(default)]
        reply_to: Option<MessageId>,
        #[serde(default)]
        mentions: Vec<UserId>,
    },
    EditMessage {
        message_id: MessageId,
        content: String,
    },
    DeleteMessage {
        message_id: MessageId,
    },
    ToggleReaction {
        message_id: MessageId,
        emoji: String,
    },
    TypingStart {
        channel_id: ChannelId,
    },
    TypingStop {
        channel_id: ChannelId,
    },
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    NewMessage(Message),
    MessageUpdated(Message),
    MessageDeleted {
        message_id: MessageId,
    },
    ReactionUpdated {
        message_id: MessageId,
        reactions: ReactionMap,
    },
    MentionNotification {
        message_id: MessageId,
        channel_id: ChannelId,
        community_id: CommunityId,
        from_user: String,
        content: String,
    },
    UserTyping {
        user_id: UserId,
        username: String,
        channel_id: ChannelId,
    },
    UserStoppedTyping {
        user_id: UserId,
        channel_id: ChannelId,
    },
    UserStatusChange {
        user_id: UserId,
        status: PresenceStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        avatar: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_seen: Option<DateTime<Utc>>,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    /// Get the event name for dispatch and metrics labels.
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerEvent::NewMessage(_) => "new_message",
            ServerEvent::MessageUpdated(_) => "message_updated",
            ServerEvent::MessageDeleted { .. } => "message_deleted",
            ServerEvent::ReactionUpdated { .. } => "reaction_updated",
            ServerEvent::MentionNotification { .. } => "mention_notification",
            ServerEvent::UserTyping { .. } => "user_typing",
            ServerEvent::UserStoppedTyping { .. } => "user_stopped_typing",
            ServerEvent::UserStatusChange { .. } => "user_status_change",
            ServerEvent::Error { .. } => "error",
        }
    }
}
