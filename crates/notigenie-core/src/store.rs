//! Record store collaborator.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Identifier-addressed access to the typed-property document store.
///
/// All identifiers passed in are already in canonical dashed form and all
/// payloads are already in the store's wire format; the executor handles
/// resolution and formatting before calling in.
///
/// # Implementation Notes
///
/// Remote rejections should surface as `NotiError::Remote` carrying the
/// store's own error code, so callers can report it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Queries a database, following pagination.
    ///
    /// # Arguments
    ///
    /// * `database_id` - Remote database identifier
    /// * `filter` - Wire filter, or `None` to list everything
    ///
    /// # Returns
    ///
    /// - `Ok(pages)`: Raw page objects in store order
    /// - `Err(_)`: The query failed
    async fn query_database(&self, database_id: &str, filter: Option<Value>) -> Result<Vec<Value>>;

    /// Creates a page in a database and returns the raw page object.
    async fn create_page(&self, database_id: &str, properties: Map<String, Value>) -> Result<Value>;

    /// Updates properties of an existing page and returns the raw page object.
    async fn update_page(&self, page_id: &str, properties: Map<String, Value>) -> Result<Value>;

    /// Appends block children and returns the raw response.
    async fn append_children(&self, block_id: &str, children: Vec<Value>) -> Result<Value>;

    /// Checks that the credentials are accepted.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The store answered the identity probe
    /// - `Err(_)`: Unreachable or unauthorized
    async fn validate_connection(&self) -> Result<()>;
}
