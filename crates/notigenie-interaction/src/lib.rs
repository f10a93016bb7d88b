//! Remote collaborators: the Gemini language model and the Notion record store.

pub mod gemini;
pub mod notion;

pub use gemini::GeminiLanguageModel;
pub use notion::NotionStore;
