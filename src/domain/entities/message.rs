//! Message entity.
//!
//! A message lives in exactly one channel's log. Its lifecycle is
//! `created -> [edited]* -> deleted | expired`; both terminal transitions
//! converge on the soft-deleted representation and no further mutation is
//! accepted afterwards.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, MessageId, UserId};

/// Message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// A regular text message
    #[default]
    Text,
    /// An image upload
    Image,
    /// A file upload
    File,
    /// A server-generated message
    System,
    /// A channel announcement
    Announcement,
}

impl MessageType {
    /// Convert from wire string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "text" => Self::Text,
            "image" => Self::Image,
            "file" => Self::File,
            "system" => Self::System,
            "announcement" => Self::Announcement,
            _ => Self::Text,
        }
    }

    /// Convert to wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
            Self::System => "system",
            Self::Announcement => "announcement",
        }
    }

    /// Check if this is a server-generated message type.
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Emoji -> set of user IDs who reacted with it.
pub type ReactionMap = BTreeMap<String, BTreeSet<UserId>>;

/// Represents a message in a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Snowflake ID
    pub id: MessageId,

    /// Channel this message belongs to
    pub channel_id: ChannelId,

    /// Author user ID
    pub user_id: UserId,

    /// Message content
    pub content: String,

    /// Type of message
    #[serde(rename = "type")]
    pub message_type: MessageType,

    /// Opaque attachment metadata (file info, image dimensions, ...)
    pub metadata: serde_json::Value,

    /// ID of the message being replied to
    pub reply_to: Option<MessageId>,

    /// Mentioned user IDs
    pub mentions: Vec<UserId>,

    /// Reactions by emoji
    pub reactions: ReactionMap,

    /// Whether the content has been edited
    pub is_edited: bool,

    /// Timestamp of the last edit (None if never edited)
    pub edited_at: Option<DateTime<Utc>>,

    /// Whether the message has been soft-deleted
    pub is_deleted: bool,

    /// Timestamp of the soft delete (None if live)
    pub deleted_at: Option<DateTime<Utc>>,

    /// Timestamp when the message was sent
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last mutation
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Get the content length in characters.
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }

    /// Check if this is a reply message.
    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    /// Apply an edit. Caller must have verified the message is not terminal.
    pub fn apply_edit(&mut self, content: String, now: DateTime<Utc>) {
        self.content = content;
        self.is_edited = true;
        self.edited_at = Some(now);
        self.updated_at = now;
    }

    /// Transition to the terminal soft-deleted state. Idempotent: a second
    /// call leaves `deleted_at` untouched.
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        if self.is_deleted {
            return;
        }
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    /// Toggle a user's reaction for an emoji. Returns `true` when the
    /// reaction was added, `false` when it was removed. Emptied emoji sets
    /// are dropped from the map so a toggle pair restores the original state.
    pub fn toggle_reaction(&mut self, user_id: &str, emoji: &str, now: DateTime<Utc>) -> bool {
        self.updated_at = now;
        let users = self.reactions.entry(emoji.to_string()).or_default();
        if users.remove(user_id) {
            if users.is_empty() {
                self.reactions.remove(emoji);
            }
            false
        } else {
            users.insert(user_id.to_string());
            true
        }
    }
}
