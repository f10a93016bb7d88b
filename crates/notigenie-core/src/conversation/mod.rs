//! Conversation domain module.
//!
//! - `model`: Turns and the time-limited, size-bounded window
//! - `store`: Transactional per-session persistence trait

mod model;
mod store;

pub use model::{ConversationWindow, Role, Turn};
pub use store::{SessionStore, WindowUpdate};
