use super::identifier::normalize_identifier;
use super::model::{PropertyType, SchemaEntry};
use super::source::SchemaSource;
use crate::error::{NotiError, Result};
use std::collections::BTreeMap;

/// In-memory mapping from logical database name to its schema.
///
/// Constructed once at process start and shared read-only (behind an `Arc`)
/// by the selector, synthesizer, formatter and executor.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, SchemaEntry>,
}

impl SchemaRegistry {
    /// Creates a registry with no schemas. Every lookup returns absent.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a registry from already-loaded entries.
    ///
    /// A later entry with the same logical name replaces an earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = SchemaEntry>) -> Self {
        let mut schemas = BTreeMap::new();
        for entry in entries {
            match entry.title_property_count() {
                1 => {}
                0 => tracing::warn!(
                    schema = %entry.name,
                    "Schema declares no title property; the configured default will be used"
                ),
                n => tracing::warn!(
                    schema = %entry.name,
                    count = n,
                    "Schema declares several title properties; the first one wins"
                ),
            }
            if let Some(previous) = schemas.insert(entry.name.clone(), entry) {
                tracing::warn!(schema = %previous.name, "Duplicate schema definition replaced");
            }
        }
        Self { schemas }
    }

    /// Loads every schema from `source`.
    ///
    /// Never fails: an unreachable or empty source yields an empty registry,
    /// and downstream operations report "not found" instead of crashing.
    pub async fn load(source: &dyn SchemaSource) -> Self {
        match source.load_all().await {
            Ok(entries) if entries.is_empty() => {
                tracing::warn!(
                    "Schema source returned no schemas; no database operations will be possible"
                );
                Self::empty()
            }
            Ok(entries) => {
                let registry = Self::from_entries(entries);
                tracing::info!(count = registry.len(), "Loaded database schemas");
                registry
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load database schemas");
                Self::empty()
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Raw remote identifier for `name`; empty identifiers count as absent.
    pub fn resolve_id(&self, name: &str) -> Option<&str> {
        self.schemas
            .get(name)
            .map(|s| s.database_id.as_str())
            .filter(|id| !id.trim().is_empty())
    }

    /// Remote identifier for `name` in canonical dashed form.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the name is not registered or has no identifier
    /// - `InvalidIdentifier` if the registered identifier is malformed
    pub fn resolve_database_id(&self, name: &str) -> Result<String> {
        let raw = self
            .resolve_id(name)
            .ok_or_else(|| NotiError::not_found("Database", name))?;
        normalize_identifier(raw)
    }

    /// Declared type of `property` in schema `name`.
    pub fn resolve_property_type(&self, name: &str, property: &str) -> Option<&PropertyType> {
        self.schemas
            .get(name)
            .and_then(|s| s.property(property))
            .map(|p| &p.property_type)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
