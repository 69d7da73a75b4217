//! Domain Layer
//!
//! Core entities and value objects. Channel and message ids are process-local
//! snowflakes; user and community ids are opaque strings issued by the
//! external identity platform.

pub mod entities;
pub mod value_objects;

/// Snowflake id of a channel.
pub type ChannelId = i64;
/// Snowflake id of a message.
pub type MessageId = i64;
/// Opaque user id from the identity platform.
pub type UserId = String;
/// Opaque community id from the platform.
pub type CommunityId = String;

pub use entities::{
    Channel, ChannelSettings, ChannelSettingsPatch, ChannelType, Message, MessageType,
    PresenceStatus, ReactionMap, Session,
};
pub use value_objects::{ChannelAction, ChannelPermissions, Grant, Role};
