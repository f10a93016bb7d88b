//! Schema source backed by a directory of JSON documents.

use crate::dto::SchemaDocument;
use async_trait::async_trait;
use notigenie_core::schema::{SchemaEntry, SchemaSource};
use notigenie_core::{NotiError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads `<dir>/<logical_name>.json`, one document per logical database.
///
/// Unreadable documents are skipped with a warning; a missing directory is
/// an error of the source as a whole.
#[derive(Debug, Clone)]
pub struct JsonDirSchemaSource {
    dir: PathBuf,
}

impl JsonDirSchemaSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_document(path: &Path) -> Result<SchemaDocument> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl SchemaSource for JsonDirSchemaSource {
    async fn load_all(&self) -> Result<Vec<SchemaEntry>> {
        let mut reader = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            NotiError::config(format!(
                "Cannot read schema directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut paths = Vec::new();
        while let Some(item) = reader.next_entry().await? {
            let path = item.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match Self::read_document(&path).await {
                Ok(document) => {
                    debug!(schema = name, "Read schema document");
                    entries.push(document.into_entry(name));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable schema document"),
            }
        }
        Ok(entries)
    }
}
