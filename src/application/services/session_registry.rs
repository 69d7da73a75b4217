//! Session Registry
//!
//! Maps each user to their session and live connection. Reads are lock-free
//! via `DashMap`; updates take the per-key shard lock only, so distinct users
//! never contend. The registry is the only component that owns connection
//! handles; everyone else goes through `lookup`.

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::events::ServerEvent;
use crate::domain::{CommunityId, PresenceStatus, Session, UserId};
use crate::infrastructure::metrics;

/// Handle for delivering events to one connection. Sends are synchronous and
/// never block; a closed receiver means the recipient is skipped.
pub type ConnectionRef = mpsc::UnboundedSender<ServerEvent>;

struct LiveConnection {
    id: Uuid,
    sender: ConnectionRef,
}

struct SessionEntry {
    session: Session,
    conn: Option<LiveConnection>,
}

/// Registry of user sessions and their live connections.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<UserId, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) the live mapping for a user.
    ///
    /// Re-authentication from a new connection replaces the previous
    /// connection reference; the old connection is not closed here.
    /// Broadcasts the online transition to all other live sessions.
    pub fn authenticate(
        &self,
        user_id: &str,
        username: &str,
        avatar: Option<String>,
        connection_id: Uuid,
        sender: ConnectionRef,
    ) -> Session {
        let session = {
            let mut entry = self
                .sessions
                .entry(user_id.to_string())
                .or_insert_with(|| SessionEntry {
                    session: Session::new(user_id.to_string(), username.to_string(), None),
                    conn: None,
                });
            entry.session.username = username.to_string();
            entry.session.avatar = avatar.clone();
            entry.session.status = PresenceStatus::Online;
            entry.session.last_seen = Utc::now();
            entry.conn = Some(LiveConnection {
                id: connection_id,
                sender,
            });
            entry.session.clone()
        };

        tracing::info!(user_id = %user_id, connection_id = %connection_id, "Session authenticated");
        metrics::set_authenticated_sessions(self.online_count() as i64);

        self.broadcast_except(
            user_id,
            ServerEvent::UserStatusChange {
                user_id: user_id.to_string(),
                status: PresenceStatus::Online,
                username: Some(username.to_string()),
                avatar,
                last_seen: None,
            },
        );

        session
    }

    /// Transition a session to offline and release its connection reference.
    ///
    /// The closing connection must still be the registered one; a stale
    /// socket closing after a re-authentication is ignored so the newer
    /// connection stays online (last-writer-wins).
    pub fn disconnect(&self, user_id: &str, connection_id: Uuid) {
        let last_seen = {
            let Some(mut entry) = self.sessions.get_mut(user_id) else {
                return;
            };
            match &entry.conn {
                Some(conn) if conn.id == connection_id => {}
                _ => {
                    tracing::debug!(user_id = %user_id, "Ignoring disconnect from superseded connection");
                    return;
                }
            }
            entry.conn = None;
            entry.session.status = PresenceStatus::Offline;
            entry.session.last_seen = Utc::now();
            entry.session.last_seen
        };

        tracing::info!(user_id = %user_id, "Session disconnected");
        metrics::set_authenticated_sessions(self.online_count() as i64);

        self.broadcast_except(
            user_id,
            ServerEvent::UserStatusChange {
                user_id: user_id.to_string(),
                status: PresenceStatus::Offline,
                username: None,
                avatar: None,
                last_seen: Some(last_seen),
            },
        );
    }

    /// Get the live connection for a user, if online.
    pub fn lookup(&self, user_id: &str) -> Option<ConnectionRef> {
        self.sessions
            .get(user_id)
            .and_then(|entry| entry.conn.as_ref().map(|c| c.sender.clone()))
    }

    /// Get a snapshot of a user's session.
    pub fn session(&self, user_id: &str) -> Option<Session> {
        self.sessions.get(user_id).map(|entry| entry.session.clone())
    }

    /// Record that a user's session joined a community.
    pub fn join_community(&self, user_id: &str, community_id: &str) {
        if let Some(mut entry) = self.sessions.get_mut(user_id) {
            entry.session.communities.insert(community_id.to_string());
        }
    }

    /// Snapshot of online sessions that joined the given community.
    pub fn online_users(&self, community_id: &CommunityId) -> Vec<Session> {
        self.sessions
            .iter()
            .filter(|entry| {
                entry.session.is_online() && entry.session.communities.contains(community_id)
            })
            .map(|entry| entry.session.clone())
            .collect()
    }

    /// Deliver an event to a user's live connection. Returns `false` when the
    /// user is offline or the connection is gone.
    pub fn send_to(&self, user_id: &str, event: ServerEvent) -> bool {
        match self.lookup(user_id) {
            Some(conn) => {
                metrics::record_event_dispatched(event.event_name());
                conn.send(event).is_ok()
            }
            None => false,
        }
    }

    /// Number of sessions ever registered (online or offline).
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of currently online sessions.
    pub fn online_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.session.is_online())
            .count()
    }

    /// Fire-and-forget broadcast to every live session except one. A failed
    /// send is a skipped recipient, never an error.
    fn broadcast_except(&self, except: &str, event: ServerEvent) {
        for entry in self.sessions.iter() {
            if entry.key() == except {
                continue;
            }
            if let Some(conn) = &entry.conn {
                metrics::record_event_dispatched(event.event_name());
                let _ = conn.sender.send(event.clone());
            }
        }
    }
}
