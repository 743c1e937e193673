//! Action logger: append-only side-effect record of tool invocations and
//! completed conversation turns.
//!
//! The logger formats entries and forwards them to a [`LogSink`]. Only tool
//! invocations are logged, never their results: results can be large and
//! are already visible in the thread. Sink failures are reported through
//! `tracing` and otherwise dropped; the log is an advisory record, not part
//! of the conversation state.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

/// Error appending to a log sink.
#[derive(Error, Debug)]
#[error("log sink error: {0}")]
pub struct SinkError(pub String);

/// Append-only sink for human-readable log entries.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Append one formatted entry at the end of the log.
    async fn append(&self, entry: &str) -> Result<(), SinkError>;
}

/// Formats and records assistant activity, keyed by assistant name and
/// UTC timestamp.
#[derive(Clone)]
pub struct ActionLogger {
    sink: Arc<dyn LogSink>,
}

impl ActionLogger {
    /// Create a logger writing to the given sink.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Create a logger that discards everything.
    pub fn disabled() -> Self {
        Self {
            sink: Arc::new(NullSink),
        }
    }

    /// Record one tool invocation before it is dispatched.
    pub async fn log_action(&self, assistant: &str, action: &str, details: &str) {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let mut entry = format!("\n[{assistant} Action Log {timestamp}] {action}");
        if !details.is_empty() {
            entry.push_str(&format!(" - {details}"));
        }
        entry.push('\n');

        if let Err(e) = self.sink.append(&entry).await {
            warn!(assistant, action, "failed to log action: {e}");
        }
    }

    /// Record one completed conversation turn: the original user text and
    /// the final assistant text.
    pub async fn log_conversation(&self, assistant: &str, user_text: &str, response_text: &str) {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let entry = format!(
            "\n\n--- {assistant} Conversation Log ({timestamp}) ---\n\
             User: {user_text}\n\n\
             {assistant}: {response_text}\n\
             --- End of Log Entry ---\n"
        );

        if let Err(e) = self.sink.append(&entry).await {
            warn!(assistant, "failed to log conversation: {e}");
        }
    }
}

impl std::fmt::Debug for ActionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionLogger").finish_non_exhaustive()
    }
}

/// Sink that discards all entries.
pub struct NullSink;

#[async_trait]
impl LogSink for NullSink {
    async fn append(&self, _entry: &str) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-memory sink collecting entries in order. Used in tests and as a demo
/// backend when no external log document is wired up.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended entries.
    pub async fn entries(&self) -> Vec<String> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn append(&self, entry: &str) -> Result<(), SinkError> {
        self.entries.lock().await.push(entry.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_action_entry_format() {
        let sink = Arc::new(MemorySink::new());
        let logger = ActionLogger::new(sink.clone());

        logger
            .log_action("Chief of Staff", "Tool Called: calendar_list", "{\"max_results\": 5}")
            .await;

        let entries = sink.entries().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].contains("[Chief of Staff Action Log "));
        assert!(entries[0].contains("Tool Called: calendar_list - {\"max_results\": 5}"));
    }

    #[tokio::test]
    async fn test_action_entry_without_details() {
        let sink = Arc::new(MemorySink::new());
        let logger = ActionLogger::new(sink.clone());

        logger.log_action("Chief of Staff", "Run started", "").await;

        let entries = sink.entries().await;
        assert!(entries[0].ends_with("Run started\n"));
        assert!(!entries[0].contains(" - "));
    }

    #[tokio::test]
    async fn test_conversation_entry_format() {
        let sink = Arc::new(MemorySink::new());
        let logger = ActionLogger::new(sink.clone());

        logger
            .log_conversation("Head of Strategy", "Should we expand?", "Green light.")
            .await;

        let entries = sink.entries().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].contains("--- Head of Strategy Conversation Log ("));
        assert!(entries[0].contains("User: Should we expand?"));
        assert!(entries[0].contains("Head of Strategy: Green light."));
        assert!(entries[0].contains("--- End of Log Entry ---"));
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        struct FailingSink;

        #[async_trait]
        impl LogSink for FailingSink {
            async fn append(&self, _entry: &str) -> Result<(), SinkError> {
                Err(SinkError("document unavailable".into()))
            }
        }

        let logger = ActionLogger::new(Arc::new(FailingSink));
        // Must not panic or propagate.
        logger.log_action("Agent", "Tool Called: x", "").await;
        logger.log_conversation("Agent", "hi", "hello").await;
    }
}
