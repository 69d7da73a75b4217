//! Application Startup
//!
//! Component wiring and server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

use crate::application::services::{
    ChannelStore, MentionNotifier, MessageStore, PresenceBroadcaster, RetentionScheduler,
    SessionRegistry,
};
use crate::config::Settings;
use crate::infrastructure::LogNotificationQueue;
use crate::presentation::http::routes;
use crate::shared::SnowflakeGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sessions: Arc<SessionRegistry>,
    pub channels: Arc<ChannelStore>,
    pub messages: Arc<MessageStore>,
    pub presence: Arc<PresenceBroadcaster>,
}

impl AppState {
    /// Wire up the engine components.
    ///
    /// Must run inside a Tokio runtime: the retention expiry worker is
    /// spawned here.
    pub fn build(settings: Settings) -> Self {
        let ids = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id as u64,
            settings.snowflake.node_id as u64,
        ));

        let sessions = Arc::new(SessionRegistry::new());
        let channels = Arc::new(ChannelStore::new(Arc::clone(&ids)));

        let notifier = Arc::new(MentionNotifier::new(
            Arc::clone(&channels),
            Arc::clone(&sessions),
            Arc::new(LogNotificationQueue),
        ));

        let (retention, expired_rx) = RetentionScheduler::new();

        let messages = Arc::new(MessageStore::new(
            Arc::clone(&channels),
            Arc::clone(&sessions),
            notifier,
            Arc::new(retention),
            ids,
        ));
        messages.spawn_expiry_worker(expired_rx);

        let presence = Arc::new(PresenceBroadcaster::new(
            Arc::clone(&channels),
            Arc::clone(&sessions),
            Duration::from_secs(settings.presence.typing_ttl_secs),
        ));

        Self {
            settings: Arc::new(settings),
            sessions,
            channels,
            messages,
            presence,
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let addr = settings.server.socket_addr();
        let state = AppState::build(settings);

        let router = routes::create_router(state);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
