//! Message Store
//!
//! The authoritative per-channel message log. All mutating operations for a
//! given channel are linearized through that channel's worker task: one
//! inbound command queue per channel, replies over oneshot channels.
//! Different channels proceed fully in parallel.
//!
//! The worker owns the channel's log and the per-user last-send timestamps
//! used by slow mode; a global message-id index routes edits, deletes and
//! reactions to the owning channel. Broadcast fan-out happens inside the
//! worker so every member observes mutations for one channel in the same
//! order the worker applied them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};

use crate::application::events::ServerEvent;
use crate::application::services::{
    ChannelStore, MentionNotifier, RetentionScheduler, SessionRegistry,
};
use crate::domain::{ChannelAction, ChannelId, Message, MessageId, MessageType, ReactionMap, UserId};
use crate::infrastructure::metrics;
use crate::shared::{ChatError, SnowflakeGenerator};

/// Parameters for storing a new message.
#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub content: String,
    pub message_type: MessageType,
    pub metadata: serde_json::Value,
    pub reply_to: Option<MessageId>,
    pub mentions: Vec<UserId>,
}

/// History query. `before` is the stable cursor for infinite scroll; `page`
/// switches to offset mode for administrative listing.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub before: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: usize,
}

/// One page of history plus the size of the full filtered set.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub messages: Vec<Message>,
    pub total: usize,
}

enum ChannelCommand {
    Send {
        sender: UserId,
        request: SendMessageRequest,
        reply: oneshot::Sender<Result<Message, ChatError>>,
    },
    Edit {
        message_id: MessageId,
        editor: UserId,
        content: String,
        reply: oneshot::Sender<Result<Message, ChatError>>,
    },
    Delete {
        message_id: MessageId,
        actor: UserId,
        can_manage: bool,
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    React {
        message_id: MessageId,
        user: UserId,
        emoji: String,
        reply: oneshot::Sender<Result<ReactionMap, ChatError>>,
    },
    History {
        query: HistoryQuery,
        reply: oneshot::Sender<HistoryPage>,
    },
    Expire {
        message_id: MessageId,
    },
}

/// Per-channel message log with linearized mutation.
pub struct MessageStore {
    channels: Arc<ChannelStore>,
    sessions: Arc<SessionRegistry>,
    notifier: Arc<MentionNotifier>,
    retention: Arc<RetentionScheduler>,
    ids: Arc<SnowflakeGenerator>,
    workers: DashMap<ChannelId, mpsc::UnboundedSender<ChannelCommand>>,
    /// message id -> owning channel, for command routing
    index: Arc<DashMap<MessageId, ChannelId>>,
}

impl MessageStore {
    pub fn new(
        channels: Arc<ChannelStore>,
        sessions: Arc<SessionRegistry>,
        notifier: Arc<MentionNotifier>,
        retention: Arc<RetentionScheduler>,
        ids: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            channels,
            sessions,
            notifier,
            retention,
            ids,
            workers: DashMap::new(),
            index: Arc::new(DashMap::new()),
        }
    }

    /// Validate, store and fan out a new message.
    pub async fn send_message(
        &self,
        sender: &str,
        channel_id: ChannelId,
        request: SendMessageRequest,
    ) -> Result<Message, ChatError> {
        if !self
            .channels
            .has_permission(sender, channel_id, ChannelAction::SendMessage)?
        {
            return Err(ChatError::PermissionDenied(
                "Missing send_message permission".into(),
            ));
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(
            channel_id,
            ChannelCommand::Send {
                sender: sender.to_string(),
                request,
                reply: reply_tx,
            },
        )?;
        await_reply(reply_rx).await?
    }

    /// Replace a message's content. Only the author may edit; moderators get
    /// no override here.
    pub async fn edit_message(
        &self,
        editor: &str,
        message_id: MessageId,
        content: String,
    ) -> Result<Message, ChatError> {
        let channel_id = self.channel_of(message_id)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(
            channel_id,
            ChannelCommand::Edit {
                message_id,
                editor: editor.to_string(),
                content,
                reply: reply_tx,
            },
        )?;
        await_reply(reply_rx).await?
    }

    /// Soft-delete a message. Authorized for the author or anyone holding
    /// `manage_messages` in the channel. Deleting an already-deleted message
    /// is a no-op success.
    pub async fn delete_message(&self, actor: &str, message_id: MessageId) -> Result<(), ChatError> {
        let channel_id = self.channel_of(message_id)?;
        let can_manage = self
            .channels
            .has_permission(actor, channel_id, ChannelAction::ManageMessages)
            .unwrap_or(false);

        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(
            channel_id,
            ChannelCommand::Delete {
                message_id,
                actor: actor.to_string(),
                can_manage,
                reply: reply_tx,
            },
        )?;
        await_reply(reply_rx).await?
    }

    /// Toggle a user's reaction on a message. Returns the full reaction map
    /// after the toggle.
    pub async fn toggle_reaction(
        &self,
        user: &str,
        message_id: MessageId,
        emoji: String,
    ) -> Result<ReactionMap, ChatError> {
        let channel_id = self.channel_of(message_id)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(
            channel_id,
            ChannelCommand::React {
                message_id,
                user: user.to_string(),
                emoji,
                reply: reply_tx,
            },
        )?;
        await_reply(reply_rx).await?
    }

    /// Read non-deleted history, newest first.
    pub async fn get_history(
        &self,
        channel_id: ChannelId,
        query: HistoryQuery,
    ) -> Result<HistoryPage, ChatError> {
        // Distinguish an unknown channel from an empty log.
        self.channels.get(channel_id)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(channel_id, ChannelCommand::History { query, reply: reply_tx })?;
        await_reply(reply_rx).await
    }

    /// Drive soft-deletes from the retention scheduler's expiry stream.
    pub fn spawn_expiry_worker(self: &Arc<Self>, mut expired_rx: mpsc::UnboundedReceiver<MessageId>) {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(message_id) = expired_rx.recv().await {
                store.expire(message_id);
            }
        });
    }

    /// Apply a retention expiry. A no-op when the message is unknown or
    /// already deleted, so a fired timer racing a manual delete is benign.
    pub fn expire(&self, message_id: MessageId) {
        let Some(channel_id) = self.index.get(&message_id).map(|e| *e) else {
            return;
        };
        let _ = self.dispatch(channel_id, ChannelCommand::Expire { message_id });
    }

    fn channel_of(&self, message_id: MessageId) -> Result<ChannelId, ChatError> {
        self.index
            .get(&message_id)
            .map(|entry| *entry)
            .ok_or_else(|| ChatError::NotFound("Message not found".into()))
    }

    fn dispatch(&self, channel_id: ChannelId, command: ChannelCommand) -> Result<(), ChatError> {
        self.worker(channel_id)
            .send(command)
            .map_err(|_| ChatError::Internal("Channel worker unavailable".into()))
    }

    /// Get (or lazily spawn) the worker owning a channel's log.
    fn worker(&self, channel_id: ChannelId) -> mpsc::UnboundedSender<ChannelCommand> {
        self.workers
            .entry(channel_id)
            .or_insert_with(|| {
                let (tx, rx) = mpsc::unbounded_channel();
                let worker = ChannelWorker {
                    channel_id,
                    log: BTreeMap::new(),
                    last_send: HashMap::new(),
                    channels: Arc::clone(&self.channels),
                    sessions: Arc::clone(&self.sessions),
                    notifier: Arc::clone(&self.notifier),
                    retention: Arc::clone(&self.retention),
                    ids: Arc::clone(&self.ids),
                    index: Arc::clone(&self.index),
                };
                tokio::spawn(worker.run(rx));
                tx
            })
            .clone()
    }
}

async fn await_reply<T>(rx: oneshot::Receiver<T>) -> Result<T, ChatError> {
    rx.await
        .map_err(|_| ChatError::Internal("Channel worker unavailable".into()))
}

/// Task-local owner of one channel's message log.
struct ChannelWorker {
    channel_id: ChannelId,
    /// Snowflake-keyed log; descending key order is (created_at, id) descending.
    log: BTreeMap<MessageId, Message>,
    /// Last accepted send per user, for slow mode.
    last_send: HashMap<UserId, tokio::time::Instant>,
    channels: Arc<ChannelStore>,
    sessions: Arc<SessionRegistry>,
    notifier: Arc<MentionNotifier>,
    retention: Arc<RetentionScheduler>,
    ids: Arc<SnowflakeGenerator>,
    index: Arc<DashMap<MessageId, ChannelId>>,
}

impl ChannelWorker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ChannelCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                ChannelCommand::Send { sender, request, reply } => {
                    let _ = reply.send(self.handle_send(sender, request));
                }
                ChannelCommand::Edit {
                    message_id,
                    editor,
                    content,
                    reply,
                } => {
                    let _ = reply.send(self.handle_edit(message_id, &editor, content));
                }
                ChannelCommand::Delete {
                    message_id,
                    actor,
                    can_manage,
                    reply,
                } => {
                    let _ = reply.send(self.handle_delete(message_id, &actor, can_manage));
                }
                ChannelCommand::React {
                    message_id,
                    user,
                    emoji,
                    reply,
                } => {
                    let _ = reply.send(self.handle_react(message_id, &user, &emoji));
                }
                ChannelCommand::History { query, reply } => {
                    let _ = reply.send(self.handle_history(query));
                }
                ChannelCommand::Expire { message_id } => self.handle_expire(message_id),
            }
        }
    }

    fn handle_send(
        &mut self,
        sender: UserId,
        request: SendMessageRequest,
    ) -> Result<Message, ChatError> {
        let settings = self.channels.settings(self.channel_id)?;

        if settings.slow_mode_seconds > 0 {
            if let Some(last) = self.last_send.get(&sender) {
                let interval = Duration::from_secs(settings.slow_mode_seconds as u64);
                if last.elapsed() < interval {
                    return Err(ChatError::RateLimited);
                }
            }
        }

        if request.content.chars().count() > settings.max_message_length {
            return Err(ChatError::Validation(format!(
                "Message exceeds maximum length of {} characters",
                settings.max_message_length
            )));
        }

        let now = Utc::now();
        let message = Message {
            id: self.ids.generate(),
            channel_id: self.channel_id,
            user_id: sender.clone(),
            content: request.content,
            message_type: request.message_type,
            metadata: request.metadata,
            reply_to: request.reply_to,
            mentions: request.mentions,
            reactions: ReactionMap::new(),
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        self.last_send.insert(sender, tokio::time::Instant::now());
        self.index.insert(message.id, self.channel_id);
        self.log.insert(message.id, message.clone());
        metrics::record_message_op("send");

        self.broadcast(ServerEvent::NewMessage(message.clone()));

        // Mention delivery runs off-task and never blocks acceptance.
        if !message.mentions.is_empty() && settings.allow_mentions {
            self.notifier.dispatch(message.clone());
        }

        if settings.auto_delete_minutes > 0 {
            self.retention.schedule(
                message.id,
                Duration::from_secs(settings.auto_delete_minutes as u64 * 60),
            );
        }

        Ok(message)
    }

    fn handle_edit(
        &mut self,
        message_id: MessageId,
        editor: &str,
        content: String,
    ) -> Result<Message, ChatError> {
        let settings = self.channels.settings(self.channel_id)?;
        let message = self
            .log
            .get_mut(&message_id)
            .filter(|m| !m.is_deleted)
            .ok_or_else(|| ChatError::NotFound("Message not found".into()))?;

        if message.user_id != editor {
            return Err(ChatError::PermissionDenied(
                "Only the author may edit a message".into(),
            ));
        }

        if content.chars().count() > settings.max_message_length {
            return Err(ChatError::Validation(format!(
                "Message exceeds maximum length of {} characters",
                settings.max_message_length
            )));
        }

        message.apply_edit(content, Utc::now());
        let message = message.clone();
        metrics::record_message_op("edit");

        self.broadcast(ServerEvent::MessageUpdated(message.clone()));
        Ok(message)
    }

    fn handle_delete(
        &mut self,
        message_id: MessageId,
        actor: &str,
        can_manage: bool,
    ) -> Result<(), ChatError> {
        let Some(message) = self.log.get_mut(&message_id) else {
            return Err(ChatError::NotFound("Message not found".into()));
        };

        // Terminal already: whichever delete came first won, this one is a
        // no-op success without restamping deleted_at.
        if message.is_deleted {
            return Ok(());
        }

        if message.user_id != actor && !can_manage {
            return Err(ChatError::PermissionDenied(
                "Missing manage_messages permission".into(),
            ));
        }

        message.mark_deleted(Utc::now());
        metrics::record_message_op("delete");

        // Content is never echoed back on delete.
        self.broadcast(ServerEvent::MessageDeleted { message_id });
        Ok(())
    }

    fn handle_react(
        &mut self,
        message_id: MessageId,
        user: &str,
        emoji: &str,
    ) -> Result<ReactionMap, ChatError> {
        let settings = self.channels.settings(self.channel_id)?;
        if !settings.allow_reactions {
            return Err(ChatError::NotFound(
                "Reactions are disabled for this channel".into(),
            ));
        }

        let message = self
            .log
            .get_mut(&message_id)
            .filter(|m| !m.is_deleted)
            .ok_or_else(|| ChatError::NotFound("Message not found".into()))?;

        message.toggle_reaction(user, emoji, Utc::now());
        let reactions = message.reactions.clone();
        metrics::record_message_op("react");

        self.broadcast(ServerEvent::ReactionUpdated {
            message_id,
            reactions: reactions.clone(),
        });
        Ok(reactions)
    }

    fn handle_history(&self, query: HistoryQuery) -> HistoryPage {
        let filtered: Vec<&Message> = self
            .log
            .values()
            .rev()
            .filter(|m| !m.is_deleted)
            .filter(|m| query.before.map_or(true, |before| m.created_at < before))
            .collect();
        let total = filtered.len();

        let messages = match query.page {
            // Offset mode, for administrative listing only.
            Some(page) => {
                let start = (page.saturating_sub(1) as usize).saturating_mul(query.limit);
                filtered
                    .into_iter()
                    .skip(start)
                    .take(query.limit)
                    .cloned()
                    .collect()
            }
            None => filtered.into_iter().take(query.limit).cloned().collect(),
        };

        HistoryPage { messages, total }
    }

    fn handle_expire(&mut self, message_id: MessageId) {
        let Some(message) = self.log.get_mut(&message_id) else {
            return;
        };
        if message.is_deleted {
            return;
        }

        message.mark_deleted(Utc::now());
        metrics::record_message_op("expire");
        tracing::debug!(message_id, channel_id = self.channel_id, "Message expired");

        self.broadcast(ServerEvent::MessageDeleted { message_id });
    }

    /// Best-effort fan-out to every live member connection. Dead or slow
    /// recipients are skipped, not awaited.
    fn broadcast(&self, event: ServerEvent) {
        let Ok(members) = self.channels.members(self.channel_id) else {
            return;
        };
        for member in members {
            self.sessions.send_to(&member, event.clone());
        }
    }
}
