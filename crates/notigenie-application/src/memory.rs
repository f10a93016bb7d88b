//! Conversation Memory use case.

use chrono::{DateTime, Utc};
use notigenie_core::Result;
use notigenie_core::config::SessionConfig;
use notigenie_core::conversation::{ConversationWindow, SessionStore, Turn};
use std::sync::Arc;

/// Source of the current time, injectable for tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Time-windowed, size-bounded interaction log keyed by session id.
///
/// The only component allowed to mutate a [`ConversationWindow`]; everyone
/// else sees turns through [`ConversationMemory::get_recent_history`].
#[derive(Clone)]
pub struct ConversationMemory {
    store: Arc<dyn SessionStore>,
    limit_minutes: u32,
    max_len: usize,
    clock: Clock,
}

impl ConversationMemory {
    pub fn new(store: Arc<dyn SessionStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            limit_minutes: config.history_limit_minutes,
            max_len: config.max_history_length,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn limit_minutes(&self) -> u32 {
        self.limit_minutes
    }

    /// Turns of `session_id` within the configured recency limit.
    pub async fn recent_history(&self, session_id: &str) -> Vec<Turn> {
        self.get_recent_history(session_id, self.limit_minutes).await
    }

    /// Turns of `session_id` updated within `limit_minutes`, oldest first.
    ///
    /// Best-effort: a storage error is logged and yields an empty history.
    pub async fn get_recent_history(&self, session_id: &str, limit_minutes: u32) -> Vec<Turn> {
        match self.store.load(session_id).await {
            Ok(Some(window)) => window.visible_turns((self.clock)(), limit_minutes).to_vec(),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Failed to read conversation history");
                Vec::new()
            }
        }
    }

    /// Appends one user/model exchange and trims the window.
    ///
    /// The read-modify-write runs inside the store's transactional update, so
    /// concurrent exchanges for the same session never interleave.
    pub async fn add_interaction(
        &self,
        session_id: &str,
        user_text: &str,
        model_text: &str,
    ) -> Result<()> {
        let user_text = user_text.to_string();
        let model_text = model_text.to_string();
        let clock = self.clock.clone();
        let limit_minutes = self.limit_minutes;
        let max_len = self.max_len;

        let window = self
            .store
            .update(
                session_id,
                Box::new(move |previous: Option<ConversationWindow>| {
                    ConversationWindow::record_exchange(
                        previous,
                        &user_text,
                        &model_text,
                        clock(),
                        limit_minutes,
                        max_len,
                    )
                }),
            )
            .await?;

        tracing::debug!(session_id, turns = window.turns.len(), "Recorded interaction");
        Ok(())
    }
}
