//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use gridmap_chat::{ChatSession, QueryResolver};
use gridmap_core::{GridmapConfig, MapEvent, StationDirectory};
use gridmap_view::{MapWorkspace, Subscription};

/// Capacity of the SSE fan-out channel. Slow subscribers skip ahead.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. The chat
/// session and the workspace synchronize internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GridmapConfig>,
    pub directory: Arc<StationDirectory>,
    pub chat: Arc<ChatSession>,
    pub workspace: Arc<MapWorkspace>,
    /// Broadcast sender for SSE events.
    pub event_tx: broadcast::Sender<MapEvent>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
    _forwarding: Arc<Vec<Subscription>>,
}

impl AppState {
    pub fn new(
        config: GridmapConfig,
        directory: Arc<StationDirectory>,
        resolver: Arc<dyn QueryResolver>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let workspace = Arc::new(MapWorkspace::new(
            Arc::clone(&directory),
            config.map.clone(),
        ));
        let chat = Arc::new(ChatSession::new(
            resolver,
            Arc::clone(&directory),
            config.assistant.max_message_length,
        ));

        let tx = event_tx.clone();
        let forwarding = workspace.subscribe_events(move |event| {
            tracing::trace!(event = event.name(), "Forwarding map event");
            // No receivers just means no stream is open
            let _ = tx.send(event);
        });

        Self {
            config: Arc::new(config),
            directory,
            chat,
            workspace,
            event_tx,
            start_time: Instant::now(),
            _forwarding: Arc::new(forwarding),
        }
    }
}
