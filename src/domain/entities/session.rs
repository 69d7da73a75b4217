//! User session entity.
//!
//! Tracks a user's presence and profile snapshot. Sessions are never hard
//! deleted; a disconnect transitions the session to offline and stamps
//! `last_seen`, keeping the history useful for presence queries.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CommunityId, UserId};

/// Presence status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    #[default]
    Offline,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a user's session with the chat engine.
///
/// The live connection handle is not part of the entity; it is owned
/// exclusively by the session registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// User ID from the external identity platform
    pub user_id: UserId,

    /// Display name at authentication time
    pub username: String,

    /// Avatar URL, if any
    pub avatar: Option<String>,

    /// Current presence status
    pub status: PresenceStatus,

    /// Last time the user was seen online
    pub last_seen: DateTime<Utc>,

    /// Communities this session has joined
    #[serde(skip)]
    pub communities: HashSet<CommunityId>,
}

impl Session {
    /// Create a fresh online session.
    pub fn new(user_id: UserId, username: String, avatar: Option<String>) -> Self {
        Self {
            user_id,
            username,
            avatar,
            status: PresenceStatus::Online,
            last_seen: Utc::now(),
            communities: HashSet::new(),
        }
    }

    /// Check if the session is currently online.
    pub fn is_online(&self) -> bool {
        self.status == PresenceStatus::Online
    }
}
