//! Per-thread conversation store.
//!
//! Maps a thread identifier to an ordered, append-only message history.
//! Pure bookkeeping: no operation here can fail, and no appended message is
//! ever rewritten or removed. Resetting a thread discards it and mints a
//! fresh id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::message::Message;

/// In-memory conversation store, cheap to clone and share.
///
/// Per-thread appends are assumed single-writer in practice (one loop
/// instance per thread at a time); this is not enforced.
#[derive(Default, Clone)]
pub struct ThreadStore {
    threads: Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl ThreadStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a thread exists for the given id.
    pub async fn get_or_create(&self, thread_id: &str) {
        let mut threads = self.threads.write().await;
        threads.entry(thread_id.to_string()).or_default();
    }

    /// Append one message to a thread, creating the thread if needed.
    pub async fn append(&self, thread_id: &str, message: Message) {
        let mut threads = self.threads.write().await;
        threads.entry(thread_id.to_string()).or_default().push(message);
    }

    /// Snapshot of a thread's history, in insertion order.
    pub async fn history(&self, thread_id: &str) -> Vec<Message> {
        let threads = self.threads.read().await;
        threads.get(thread_id).cloned().unwrap_or_default()
    }

    /// The last message of a thread, if any.
    pub async fn last_message(&self, thread_id: &str) -> Option<Message> {
        let threads = self.threads.read().await;
        threads.get(thread_id).and_then(|msgs| msgs.last().cloned())
    }

    /// Number of messages in a thread.
    pub async fn len(&self, thread_id: &str) -> usize {
        let threads = self.threads.read().await;
        threads.get(thread_id).map_or(0, Vec::len)
    }

    /// Check whether a thread exists.
    pub async fn contains(&self, thread_id: &str) -> bool {
        let threads = self.threads.read().await;
        threads.contains_key(thread_id)
    }

    /// Discard a thread and mint a fresh id for the caller to continue with.
    pub async fn reset(&self, thread_id: &str) -> String {
        let mut threads = self.threads.write().await;
        threads.remove(thread_id);
        Self::mint_id("thread")
    }

    /// Mint a globally unique thread id with the given prefix.
    pub fn mint_id(prefix: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{prefix}_{}", &suffix[..8])
    }
}

impl std::fmt::Debug for ThreadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadStore").finish_non_exhaustive()
    }
}
