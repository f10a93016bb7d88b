//! Persisted conversation document.

use chrono::{DateTime, Utc};
use notigenie_core::conversation::{ConversationWindow, Role, Turn};
use serde::{Deserialize, Serialize};

/// One conversation document per session: `{history, updated_at}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDocument {
    #[serde(default)]
    pub history: Vec<TurnDocument>,
    pub updated_at: DateTime<Utc>,
}

/// A stored turn, `{role, parts}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnDocument {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<String>,
}

impl From<ConversationDocument> for ConversationWindow {
    fn from(doc: ConversationDocument) -> Self {
        ConversationWindow {
            turns: doc
                .history
                .into_iter()
                .map(|turn| Turn {
                    role: turn.role,
                    content: turn.parts.join("\n"),
                })
                .collect(),
            updated_at: doc.updated_at,
        }
    }
}

impl From<&ConversationWindow> for ConversationDocument {
    fn from(window: &ConversationWindow) -> Self {
        ConversationDocument {
            history: window
                .turns
                .iter()
                .map(|turn| TurnDocument {
                    role: turn.role,
                    parts: vec![turn.content.clone()],
                })
                .collect(),
            updated_at: window.updated_at,
        }
    }
}
