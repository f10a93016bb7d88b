//! Persisted document shapes.

mod conversation;
mod schema;

pub use conversation::{ConversationDocument, TurnDocument};
pub use schema::SchemaDocument;
