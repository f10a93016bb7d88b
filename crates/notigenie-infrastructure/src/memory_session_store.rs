//! In-memory session store.

use async_trait::async_trait;
use notigenie_core::Result;
use notigenie_core::conversation::{ConversationWindow, SessionStore, WindowUpdate};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local session store; windows are lost on exit.
///
/// Updates run under the write lock, which makes them atomic per process.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    windows: Arc<RwLock<HashMap<String, ConversationWindow>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.windows.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationWindow>> {
        Ok(self.windows.read().await.get(session_id).cloned())
    }

    async fn update(&self, session_id: &str, update: WindowUpdate) -> Result<ConversationWindow> {
        let mut windows = self.windows.write().await;
        let next = update(windows.remove(session_id));
        windows.insert(session_id.to_string(), next.clone());
        Ok(next)
    }
}
