//! Channel roles, actions, and permission grants.
//!
//! A user's role within a channel is derived from the channel's member and
//! moderator sets; it is independent of any platform-wide role. Each channel
//! action carries a set of grants that decides which derived roles may
//! perform it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Role a user holds inside a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Moderator,
    Admin,
}

impl Role {
    /// Convert to wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Actions gated by per-channel permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelAction {
    SendMessage,
    ManageMessages,
    ManageChannel,
}

impl ChannelAction {
    /// Convert to wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendMessage => "send_message",
            Self::ManageMessages => "manage_messages",
            Self::ManageChannel => "manage_channel",
        }
    }
}

impl std::fmt::Display for ChannelAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single entry in an action's grant set: either a concrete role or the
/// wildcard `*` that admits any derived role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grant {
    Role(Role),
    Wildcard,
}

impl Grant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Role(role) => role.as_str(),
            Self::Wildcard => "*",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Self::Role(Role::Member)),
            "moderator" => Some(Self::Role(Role::Moderator)),
            "admin" => Some(Self::Role(Role::Admin)),
            "*" => Some(Self::Wildcard),
            _ => None,
        }
    }
}

impl Serialize for Grant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Grant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Grant::from_str(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown grant: {s}")))
    }
}

/// Per-channel permission table: which grants allow each action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelPermissions(pub HashMap<ChannelAction, HashSet<Grant>>);

impl ChannelPermissions {
    /// Default grant table applied at channel creation.
    pub fn defaults() -> Self {
        let mut map = HashMap::new();
        map.insert(
            ChannelAction::SendMessage,
            HashSet::from([
                Grant::Role(Role::Member),
                Grant::Role(Role::Moderator),
                Grant::Role(Role::Admin),
            ]),
        );
        map.insert(
            ChannelAction::ManageMessages,
            HashSet::from([Grant::Role(Role::Moderator), Grant::Role(Role::Admin)]),
        );
        map.insert(
            ChannelAction::ManageChannel,
            HashSet::from([Grant::Role(Role::Admin)]),
        );
        Self(map)
    }

    /// Whether a derived role may perform an action.
    ///
    /// A caller with no derived role (a non-member) is always denied,
    /// wildcard or not.
    pub fn allows(&self, action: ChannelAction, role: Option<Role>) -> bool {
        let Some(role) = role else {
            return false;
        };
        let Some(grants) = self.0.get(&action) else {
            return false;
        };
        grants.contains(&Grant::Role(role)) || grants.contains(&Grant::Wildcard)
    }
}

impl Default for ChannelPermissions {
    fn default() -> Self {
        Self::defaults()
    }
}
