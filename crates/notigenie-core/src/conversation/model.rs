//! Conversation model: turns and the time-limited window that holds them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Speaker of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

/// One message in a conversation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Ordered turns for one session plus the time of the last write.
///
/// A window older than the recency limit reads as empty; it is not deleted,
/// the next write simply starts over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationWindow {
    #[serde(default)]
    pub turns: Vec<Turn>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationWindow {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            turns: Vec::new(),
            updated_at: now,
        }
    }

    /// Whether the last write is older than `limit_minutes` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, limit_minutes: u32) -> bool {
        now - self.updated_at > Duration::minutes(i64::from(limit_minutes))
    }

    /// Turns visible at `now`, or nothing when the window has expired.
    pub fn visible_turns(&self, now: DateTime<Utc>, limit_minutes: u32) -> &[Turn] {
        if self.is_expired(now, limit_minutes) {
            &[]
        } else {
            &self.turns
        }
    }

    /// Appends one exchange and trims to `max_len`, oldest first.
    ///
    /// `previous` is whatever the store currently holds; an absent or expired
    /// window is replaced by a fresh one.
    pub fn record_exchange(
        previous: Option<Self>,
        user_text: &str,
        model_text: &str,
        now: DateTime<Utc>,
        limit_minutes: u32,
        max_len: usize,
    ) -> Self {
        let mut window = match previous {
            Some(window) if !window.is_expired(now, limit_minutes) => window,
            _ => Self::empty(now),
        };

        window.turns.push(Turn::user(user_text));
        window.turns.push(Turn::model(model_text));

        if window.turns.len() > max_len {
            let excess = window.turns.len() - max_len;
            window.turns.drain(..excess);
        }
        window.updated_at = now;
        window
    }
}
