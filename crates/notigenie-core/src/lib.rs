pub mod config;
pub mod conversation;
pub mod error;
pub mod formatter;
pub mod llm;
pub mod operation;
pub mod schema;
pub mod secret;
pub mod store;

// Re-export common error type
pub use error::{NotiError, Result};
