//! File-backed session store.
//!
//! One TOML document per session under a conversations directory. Writers for
//! the same session are serialized twice: by a per-session async mutex inside
//! the process and by the document's lock file across processes.

use crate::dto::ConversationDocument;
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use notigenie_core::conversation::{ConversationWindow, SessionStore, WindowUpdate};
use notigenie_core::{NotiError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct FileSessionStore {
    dir: PathBuf,
    session_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    fn document(&self, session_id: &str) -> AtomicTomlFile<ConversationDocument> {
        AtomicTomlFile::new(self.dir.join(format!("{}.toml", file_stem(session_id))))
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forgets the session's mutex once no other writer holds or awaits it.
    async fn release_session_lock(&self, session_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.session_locks.lock().await;
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(session_id);
        }
    }

    async fn write(&self, session_id: &str, update: WindowUpdate) -> Result<ConversationDocument> {
        let document = self.document(session_id);
        tokio::task::spawn_blocking(move || {
            document.update(|current| {
                let window = update(current.map(ConversationWindow::from));
                ConversationDocument::from(&window)
            })
        })
        .await
        .map_err(join_error)?
    }
}

/// Maps a session id onto a safe, collision-free file stem.
fn file_stem(session_id: &str) -> String {
    if session_id.is_empty() {
        return "_".to_string();
    }
    let mut stem = String::with_capacity(session_id.len());
    for byte in session_id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => stem.push(byte as char),
            other => stem.push_str(&format!("~{:02x}", other)),
        }
    }
    stem
}

fn join_error(e: tokio::task::JoinError) -> NotiError {
    NotiError::internal(format!("Session store task failed: {}", e))
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationWindow>> {
        let document = self.document(session_id);
        let loaded = tokio::task::spawn_blocking(move || document.load())
            .await
            .map_err(join_error)??;
        Ok(loaded.map(ConversationWindow::from))
    }

    async fn update(&self, session_id: &str, update: WindowUpdate) -> Result<ConversationWindow> {
        let lock = self.session_lock(session_id).await;
        let written = {
            let _guard = lock.lock().await;
            self.write(session_id, update).await
        };
        self.release_session_lock(session_id, lock).await;

        Ok(ConversationWindow::from(written?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_session_locks_are_released_after_writes() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileSessionStore::new(temp_dir.path().to_path_buf()));

        let mut handles = Vec::new();
        for i in 0..24 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let session = format!("user-{}", i % 6);
                store
                    .update(
                        &session,
                        Box::new(move |current| {
                            ConversationWindow::record_exchange(current, "hi", "hello", Utc::now(), 5, 40)
                        }),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(store.session_locks.lock().await.is_empty());
        let window = store.load("user-0").await.unwrap().unwrap();
        assert_eq!(window.turns.len(), 8);
    }

    #[test]
    fn test_file_stem_escapes_separators() {
        assert_eq!(file_stem("U1234abcd"), "U1234abcd");
        assert_eq!(file_stem("a/b"), "a~2fb");
        assert_ne!(file_stem("a/b"), file_stem("a_b"));
        assert_eq!(file_stem("../x"), "~2e~2e~2fx");
        assert_eq!(file_stem(""), "_");
    }
}
