//! Schema source trait.

use super::model::SchemaEntry;
use crate::error::Result;
use async_trait::async_trait;

/// An enumerable collection of schema documents, loaded wholesale at startup.
///
/// Implementations decide where the documents live (a directory of JSON
/// files, a document database collection, ...). Keys become logical names.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Loads every schema document.
    ///
    /// # Returns
    ///
    /// - `Ok(entries)`: All readable schemas (possibly empty)
    /// - `Err(_)`: The source itself could not be reached
    async fn load_all(&self) -> Result<Vec<SchemaEntry>>;
}
