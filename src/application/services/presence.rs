//! Presence Broadcaster
//!
//! Ephemeral typing indicators. Events are fire-and-forget fan-outs to
//! channel members; they carry no ordering guarantee relative to message
//! events and may be dropped under load without correctness impact.
//!
//! Typing state auto-clears after a TTL: every `typing_start` bumps a
//! generation counter and arms a timer, and the timer only emits the
//! stopped event if no newer start or an explicit stop superseded it.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::application::events::ServerEvent;
use crate::application::services::{ChannelStore, SessionRegistry};
use crate::domain::{ChannelId, UserId};

/// Fan-out of typing indicators with TTL auto-clear.
pub struct PresenceBroadcaster {
    channels: Arc<ChannelStore>,
    sessions: Arc<SessionRegistry>,
    typing_ttl: Duration,
    /// (channel, user) -> generation of the latest typing_start
    typing: Arc<DashMap<(ChannelId, UserId), u64>>,
}

impl PresenceBroadcaster {
    pub fn new(
        channels: Arc<ChannelStore>,
        sessions: Arc<SessionRegistry>,
        typing_ttl: Duration,
    ) -> Self {
        Self {
            channels,
            sessions,
            typing_ttl,
            typing: Arc::new(DashMap::new()),
        }
    }

    /// Broadcast `user_typing` to channel members except the sender and arm
    /// the TTL auto-clear.
    pub fn typing_start(&self, channel_id: ChannelId, user_id: &str) {
        let username = self
            .sessions
            .session(user_id)
            .map(|s| s.username)
            .unwrap_or_else(|| user_id.to_string());

        self.broadcast_except(
            channel_id,
            user_id,
            ServerEvent::UserTyping {
                user_id: user_id.to_string(),
                username,
                channel_id,
            },
        );

        let key = (channel_id, user_id.to_string());
        let generation = {
            let mut entry = self.typing.entry(key.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        let channels = Arc::clone(&self.channels);
        let sessions = Arc::clone(&self.sessions);
        let typing = Arc::clone(&self.typing);
        let ttl = self.typing_ttl;
        let user = user_id.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            // Only clear if no newer typing_start or explicit stop landed.
            let stale = typing
                .remove_if(&key, |_, current| *current == generation)
                .is_some();
            if stale {
                tracing::debug!(channel_id, user_id = %user, "Typing indicator expired");
                Self::fan_out(
                    &channels,
                    &sessions,
                    channel_id,
                    &user,
                    ServerEvent::UserStoppedTyping {
                        user_id: user.clone(),
                        channel_id,
                    },
                );
            }
        });
    }

    /// Broadcast `user_stopped_typing` to channel members except the sender
    /// and disarm any pending TTL clear.
    pub fn typing_stop(&self, channel_id: ChannelId, user_id: &str) {
        self.typing.remove(&(channel_id, user_id.to_string()));
        self.broadcast_except(
            channel_id,
            user_id,
            ServerEvent::UserStoppedTyping {
                user_id: user_id.to_string(),
                channel_id,
            },
        );
    }

    fn broadcast_except(&self, channel_id: ChannelId, except: &str, event: ServerEvent) {
        Self::fan_out(&self.channels, &self.sessions, channel_id, except, event);
    }

    fn fan_out(
        channels: &ChannelStore,
        sessions: &SessionRegistry,
        channel_id: ChannelId,
        except: &str,
        event: ServerEvent,
    ) {
        // Unknown channel: nothing to deliver, nothing to report.
        let Ok(members) = channels.members(channel_id) else {
            tracing::debug!(channel_id, "Typing event for unknown channel dropped");
            return;
        };
        for member in members {
            if member == except {
                continue;
            }
            sessions.send_to(&member, event.clone());
        }
    }
}
