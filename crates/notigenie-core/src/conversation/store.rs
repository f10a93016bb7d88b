//! Session store trait.

use super::model::ConversationWindow;
use crate::error::Result;
use async_trait::async_trait;

/// Mutation applied inside a session store transaction.
///
/// Receives the currently stored window (if any) and returns the window to
/// write back.
pub type WindowUpdate = Box<dyn FnOnce(Option<ConversationWindow>) -> ConversationWindow + Send>;

/// Per-session persistence for conversation windows.
///
/// # Implementation Notes
///
/// `update` must be a transactional read-modify-write: two concurrent calls
/// for the same session id must observe each other's writes, never a shared
/// stale base. A cancelled caller must leave either the old or the new window
/// in place, never a partial one.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the stored window for a session.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Opaque session identifier
    ///
    /// # Returns
    ///
    /// - `Ok(Some(window))`: A window exists (it may be expired)
    /// - `Ok(None)`: The session has never been written
    /// - `Err(_)`: The store could not be read
    async fn load(&self, session_id: &str) -> Result<Option<ConversationWindow>>;

    /// Atomically replaces a session's window with `update(current)`.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Opaque session identifier
    /// * `update` - Mutation run while the session is held exclusively
    ///
    /// # Returns
    ///
    /// - `Ok(window)`: The window as written
    /// - `Err(_)`: Nothing was written
    async fn update(&self, session_id: &str, update: WindowUpdate) -> Result<ConversationWindow>;
}
