//! WebSocket Connection Handler
//!
//! One task pair per connection: the read loop deserializes client events
//! and dispatches them to the engine; a writer task drains the session's
//! outbound event queue into the socket. The first event on a fresh
//! connection must be `authenticate`, within a configured timeout.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use crate::application::events::{ClientEvent, ServerEvent};
use crate::application::services::SendMessageRequest;
use crate::infrastructure::metrics;
use crate::startup::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let max_message_size = state.settings.gateway.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    metrics::add_gateway_connection(1);

    tracing::debug!(connection_id = %connection_id, "New gateway connection");

    // Split socket for concurrent read/write
    let (sender, mut receiver) = socket.split();

    // Outbound event queue; the registry hands clones of `tx` to the engine.
    let (tx, rx) = mpsc::unbounded_channel::<ServerEvent>();
    let writer_task = tokio::spawn(write_events(sender, rx));

    // The connection is useless until it authenticates.
    let auth_timeout = Duration::from_secs(state.settings.gateway.authenticate_timeout_secs);
    let identity = match timeout(auth_timeout, await_authenticate(&mut receiver, &tx)).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            tracing::debug!(connection_id = %connection_id, "Connection closed before authenticate");
            writer_task.abort();
            metrics::add_gateway_connection(-1);
            return;
        }
        Err(_) => {
            tracing::debug!(connection_id = %connection_id, "Authenticate timeout");
            let _ = tx.send(ServerEvent::Error {
                message: "Authentication timed out".into(),
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
            writer_task.abort();
            metrics::add_gateway_connection(-1);
            return;
        }
    };

    let (mut user_id, username, avatar) = identity;
    state
        .sessions
        .authenticate(&user_id, &username, avatar, connection_id, tx.clone());

    tracing::info!(
        user_id = %user_id,
        connection_id = %connection_id,
        "User connected and authenticated"
    );

    // Main event loop
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    dispatch_event(&state, &mut user_id, connection_id, &tx, event).await;
                }
                Err(e) => {
                    tracing::debug!(user_id = %user_id, error = %e, "Malformed client event");
                    let _ = tx.send(ServerEvent::Error {
                        message: format!("Malformed event: {e}"),
                    });
                }
            },
            Ok(Message::Close(_)) => {
                tracing::debug!(user_id = %user_id, "Connection closed");
                break;
            }
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by axum
            }
            Err(e) => {
                tracing::debug!(user_id = %user_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Cleanup. The registry ignores this if a newer connection took over.
    state.sessions.disconnect(&user_id, connection_id);
    writer_task.abort();
    metrics::add_gateway_connection(-1);

    tracing::info!(
        user_id = %user_id,
        connection_id = %connection_id,
        "User disconnected"
    );
}

/// Forward outbound events to the socket until the queue closes.
async fn write_events(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = rx.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!("Failed to serialize event: {}", e);
                continue;
            }
        };
        if sender.send(Message::Text(text.into())).await.is_err() {
            break;
        }
    }
}

/// Read frames until the first `authenticate` event, the connection closes,
/// or the caller's timeout fires.
async fn await_authenticate(
    receiver: &mut SplitStream<WebSocket>,
    tx: &mpsc::UnboundedSender<ServerEvent>,
) -> Option<(String, String, Option<String>)> {
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(ClientEvent::Authenticate {
                    user_id,
                    username,
                    avatar,
                }) => return Some((user_id, username, avatar)),
                Ok(_) => {
                    let _ = tx.send(ServerEvent::Error {
                        message: "Expected authenticate".into(),
                    });
                }
                Err(e) => {
                    let _ = tx.send(ServerEvent::Error {
                        message: format!("Malformed event: {e}"),
                    });
                }
            },
            Ok(Message::Close(_)) => return None,
            Err(_) => return None,
            _ => continue,
        }
    }
    None
}

/// Dispatch one client event to the engine. Failures surface to the
/// requesting connection only, as an `error` event.
async fn dispatch_event(
    state: &AppState,
    user_id: &mut String,
    connection_id: Uuid,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    event: ClientEvent,
) {
    let result = match event {
        ClientEvent::Authenticate {
            user_id: new_user_id,
            username,
            avatar,
        } => {
            // Re-authentication replaces the registered mapping.
            state
                .sessions
                .authenticate(&new_user_id, &username, avatar, connection_id, tx.clone());
            *user_id = new_user_id;
            Ok(())
        }
        ClientEvent::JoinCommunity { community_id } => {
            state.sessions.join_community(user_id, &community_id);
            Ok(())
        }
        ClientEvent::JoinChannel { channel_id } => state.channels.join(channel_id, user_id),
        ClientEvent::SendMessage {
            channel_id,
            content,
            message_type,
            metadata,
            reply_to,
            mentions,
            ..
        } => state
            .messages
            .send_message(
                user_id,
                channel_id,
                SendMessageRequest {
                    content,
                    message_type,
                    metadata,
                    reply_to,
                    mentions,
                },
            )
            .await
            .map(|_| ()),
        ClientEvent::EditMessage {
            message_id,
            content,
        } => state
            .messages
            .edit_message(user_id, message_id, content)
            .await
            .map(|_| ()),
        ClientEvent::DeleteMessage { message_id } => {
            state.messages.delete_message(user_id, message_id).await
        }
        ClientEvent::ToggleReaction { message_id, emoji } => state
            .messages
            .toggle_reaction(user_id, message_id, emoji)
            .await
            .map(|_| ()),
        ClientEvent::TypingStart { channel_id } => {
            state.presence.typing_start(channel_id, user_id);
            Ok(())
        }
        ClientEvent::TypingStop { channel_id } => {
            state.presence.typing_stop(channel_id, user_id);
            Ok(())
        }
    };

    if let Err(e) = result {
        let _ = tx.send(ServerEvent::Error {
            message: e.to_string(),
        });
    }
}
