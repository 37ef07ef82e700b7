//! Assistant panel session: message history plus the busy flag.
//!
//! A session accepts one query at a time. While a resolution is pending,
//! further submissions are rejected with [`ChatError::Busy`] rather than
//! queued, and there is no cancellation: the resolution runs on a spawned
//! task that owns the flag, so it clears only when the reply is appended.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use gridmap_core::{ChatMessage, StationDirectory};

use crate::error::ChatError;
use crate::resolver::{QueryResolver, ResolverMode};

/// First model message shown when the panel opens.
pub const GREETING: &str = "Olá! Sou seu assistente virtual Enel. Pergunte-me sobre localização de subestações, zonas de cobertura ou detalhes das bases.";

/// Holds the busy flag for the lifetime of one resolution.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One assistant conversation. History is append-only and lives in memory.
pub struct ChatSession {
    id: Uuid,
    resolver: Arc<dyn QueryResolver>,
    directory: Arc<StationDirectory>,
    messages: Arc<Mutex<Vec<ChatMessage>>>,
    busy: Arc<AtomicBool>,
    max_message_length: usize,
}

impl ChatSession {
    pub fn new(
        resolver: Arc<dyn QueryResolver>,
        directory: Arc<StationDirectory>,
        max_message_length: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            resolver,
            directory,
            messages: Arc::new(Mutex::new(vec![ChatMessage::model(GREETING)])),
            busy: Arc::new(AtomicBool::new(false)),
            max_message_length,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> ResolverMode {
        self.resolver.mode()
    }

    pub fn directory(&self) -> &StationDirectory {
        &self.directory
    }

    /// Whether a resolution is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Snapshot of the conversation, oldest first.
    pub fn history(&self) -> Result<Vec<ChatMessage>, ChatError> {
        let messages = self
            .messages
            .lock()
            .map_err(|e| ChatError::State(format!("messages lock poisoned: {}", e)))?;
        Ok(messages.clone())
    }

    /// Submit a user message and wait for the assistant reply.
    ///
    /// The resolution runs on its own task. Dropping the returned future
    /// stops the wait, not the resolution: the reply is still appended and
    /// the busy flag clears only once it is.
    ///
    /// Returns the appended model message.
    pub async fn submit(&self, text: &str) -> Result<ChatMessage, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        let busy = BusyGuard::acquire(&self.busy).ok_or_else(|| {
            tracing::debug!(session = %self.id, "Rejected submission while busy");
            ChatError::Busy
        })?;

        append(&self.messages, ChatMessage::user(text))?;
        tracing::info!(session = %self.id, mode = %self.resolver.mode(), "Resolving query");

        let session = self.id;
        let query = text.to_string();
        let resolver = Arc::clone(&self.resolver);
        let directory = Arc::clone(&self.directory);
        let messages = Arc::clone(&self.messages);

        let resolution = tokio::spawn(async move {
            let _busy = busy;
            let reply = resolver.resolve(&query, &directory).await;
            let message = ChatMessage::model(reply);
            append(&messages, message.clone())?;
            tracing::debug!(session = %session, "Reply appended");
            Ok::<_, ChatError>(message)
        });

        resolution
            .await
            .map_err(|e| ChatError::State(format!("resolution task failed: {}", e)))?
    }
}

fn append(messages: &Mutex<Vec<ChatMessage>>, message: ChatMessage) -> Result<(), ChatError> {
    let mut messages = messages
        .lock()
        .map_err(|e| ChatError::State(format!("messages lock poisoned: {}", e)))?;
    messages.push(message);
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
