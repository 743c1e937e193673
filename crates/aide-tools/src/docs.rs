//! Document store contract, document tools, and the document-backed log
//! sink used as the assistants' append-only memory log.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use aide_agent::error::Result;
use aide_agent::logger::{LogSink, SinkError};
use aide_agent::tool::{require_str, Tool, ToolDefinition};

/// Errors from a document backend.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// No document with the given id.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The backend failed.
    #[error("document service error: {0}")]
    Service(String),
}

/// A document with a flat text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Backend-assigned identifier.
    pub id: String,

    /// Document title.
    pub title: String,

    /// Full text body.
    pub body: String,
}

/// External document backend contract.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find a document by exact title.
    async fn find_by_title(&self, title: &str) -> std::result::Result<Option<Document>, DocumentError>;

    /// Create an empty document with the given title.
    async fn create(&self, title: &str) -> std::result::Result<Document, DocumentError>;

    /// Read a document by id.
    async fn read(&self, doc_id: &str) -> std::result::Result<Document, DocumentError>;

    /// Current end-of-body index of a document.
    async fn end_index(&self, doc_id: &str) -> std::result::Result<usize, DocumentError>;

    /// Insert text at a byte index of a document's body.
    async fn insert(
        &self,
        doc_id: &str,
        index: usize,
        text: &str,
    ) -> std::result::Result<(), DocumentError>;
}

/// In-memory document store used by tests and the demo wiring.
#[derive(Default)]
pub struct InMemoryDocs {
    docs: RwLock<Vec<Document>>,
}

impl InMemoryDocs {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocs {
    async fn find_by_title(&self, title: &str) -> std::result::Result<Option<Document>, DocumentError> {
        Ok(self
            .docs
            .read()
            .await
            .iter()
            .find(|d| d.title == title)
            .cloned())
    }

    async fn create(&self, title: &str) -> std::result::Result<Document, DocumentError> {
        let suffix = Uuid::new_v4().simple().to_string();
        let doc = Document {
            id: format!("doc_{}", &suffix[..12]),
            title: title.to_string(),
            body: String::new(),
        };
        self.docs.write().await.push(doc.clone());
        Ok(doc)
    }

    async fn read(&self, doc_id: &str) -> std::result::Result<Document, DocumentError> {
        self.docs
            .read()
            .await
            .iter()
            .find(|d| d.id == doc_id)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(doc_id.to_string()))
    }

    async fn end_index(&self, doc_id: &str) -> std::result::Result<usize, DocumentError> {
        Ok(self.read(doc_id).await?.body.len())
    }

    async fn insert(
        &self,
        doc_id: &str,
        index: usize,
        text: &str,
    ) -> std::result::Result<(), DocumentError> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .iter_mut()
            .find(|d| d.id == doc_id)
            .ok_or_else(|| DocumentError::NotFound(doc_id.to_string()))?;
        if index > doc.body.len() || !doc.body.is_char_boundary(index) {
            return Err(DocumentError::Service(format!(
                "insert index {index} out of bounds for document {doc_id}"
            )));
        }
        doc.body.insert_str(index, text);
        Ok(())
    }
}

/// Log sink backed by a document in the store.
///
/// Appending is fetch-end-index-then-insert with no locking across the two
/// calls: concurrent writers to the same document can interleave and
/// corrupt ordering. Known unresolved race; single-writer in practice.
pub struct DocSink {
    store: Arc<dyn DocumentStore>,
    doc_id: String,
}

impl DocSink {
    /// Open the named log document, creating it with a title header when it
    /// does not exist yet.
    pub async fn ensure(
        store: Arc<dyn DocumentStore>,
        title: &str,
    ) -> std::result::Result<Self, DocumentError> {
        let doc = match store.find_by_title(title).await? {
            Some(doc) => doc,
            None => {
                let doc = store.create(title).await?;
                store.insert(&doc.id, 0, &format!("{title}\n\n")).await?;
                doc
            }
        };
        Ok(Self {
            store,
            doc_id: doc.id,
        })
    }

    /// Id of the backing document.
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }
}

#[async_trait]
impl LogSink for DocSink {
    async fn append(&self, entry: &str) -> std::result::Result<(), SinkError> {
        let end = self
            .store
            .end_index(&self.doc_id)
            .await
            .map_err(|e| SinkError(e.to_string()))?;
        self.store
            .insert(&self.doc_id, end, entry)
            .await
            .map_err(|e| SinkError(e.to_string()))
    }
}

/// Create a new document.
pub struct DocCreateTool {
    store: Arc<dyn DocumentStore>,
}

impl DocCreateTool {
    /// Create the tool over a document backend.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DocCreateTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "doc_create",
            "Create a new empty document with the given title and return its id.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Document title"}
                },
                "required": ["title"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let title = require_str(args, "title").map_err(invalid_args("doc_create"))?;
        match self.store.create(title).await {
            Ok(doc) => Ok(format!("✓ Document '{title}' created (ID: {})", doc.id)),
            Err(e) => Ok(format!("Error creating document: {e}")),
        }
    }
}

/// Append text to the end of a document.
pub struct DocAppendTool {
    store: Arc<dyn DocumentStore>,
}

impl DocAppendTool {
    /// Create the tool over a document backend.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DocAppendTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "doc_append",
            "Append text at the end of an existing document.",
            json!({
                "type": "object",
                "properties": {
                    "doc_id": {"type": "string", "description": "Id of the document"},
                    "text": {"type": "string", "description": "Text to append"}
                },
                "required": ["doc_id", "text"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let doc_id = require_str(args, "doc_id").map_err(invalid_args("doc_append"))?;
        let text = require_str(args, "text").map_err(invalid_args("doc_append"))?;

        let end = match self.store.end_index(doc_id).await {
            Ok(end) => end,
            Err(e) => return Ok(format!("Error appending to document: {e}")),
        };
        match self.store.insert(doc_id, end, text).await {
            Ok(()) => Ok(format!("✓ Appended {} characters to {doc_id}", text.len())),
            Err(e) => Ok(format!("Error appending to document: {e}")),
        }
    }
}

/// Read a document's full text.
pub struct DocReadTool {
    store: Arc<dyn DocumentStore>,
}

impl DocReadTool {
    /// Create the tool over a document backend.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DocReadTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "doc_read",
            "Read the full text of a document by id.",
            json!({
                "type": "object",
                "properties": {
                    "doc_id": {"type": "string", "description": "Id of the document"}
                },
                "required": ["doc_id"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let doc_id = require_str(args, "doc_id").map_err(invalid_args("doc_read"))?;
        match self.store.read(doc_id).await {
            Ok(doc) => Ok(format!("Document '{}' ({}):\n{}", doc.title, doc.id, doc.body)),
            Err(e) => Ok(format!("Error reading document: {e}")),
        }
    }
}

/// Find a document by title.
pub struct DocSearchTool {
    store: Arc<dyn DocumentStore>,
}

impl DocSearchTool {
    /// Create the tool over a document backend.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DocSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "doc_search",
            "Find a document by exact title and return its id.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Title to look for"}
                },
                "required": ["title"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let title = require_str(args, "title").map_err(invalid_args("doc_search"))?;
        match self.store.find_by_title(title).await {
            Ok(Some(doc)) => Ok(format!("Found document '{title}' (ID: {})", doc.id)),
            Ok(None) => Ok(format!("No document found with title '{title}'")),
            Err(e) => Ok(format!("Error searching documents: {e}")),
        }
    }
}

/// All document tools over one backend, ready for registration.
pub fn doc_toolset(store: Arc<dyn DocumentStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(DocSearchTool::new(store.clone())),
        Arc::new(DocReadTool::new(store.clone())),
        Arc::new(DocCreateTool::new(store.clone())),
        Arc::new(DocAppendTool::new(store)),
    ]
}

fn invalid_args(tool_name: &str) -> impl Fn(String) -> aide_agent::AgentError {
    let tool_name = tool_name.to_string();
    move |message| aide_agent::AgentError::InvalidArguments {
        tool_name: tool_name.clone(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aide_agent::logger::ActionLogger;

    #[tokio::test]
    async fn test_ensure_creates_once() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocs::new());

        let sink = DocSink::ensure(store.clone(), "Agent_Memory_Log").await.unwrap();
        let again = DocSink::ensure(store.clone(), "Agent_Memory_Log").await.unwrap();
        assert_eq!(sink.doc_id(), again.doc_id());

        let doc = store.read(sink.doc_id()).await.unwrap();
        assert!(doc.body.starts_with("Agent_Memory_Log\n\n"));
    }

    #[tokio::test]
    async fn test_sink_appends_at_end() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocs::new());
        let sink = DocSink::ensure(store.clone(), "Log").await.unwrap();

        sink.append("first entry\n").await.unwrap();
        sink.append("second entry\n").await.unwrap();

        let body = store.read(sink.doc_id()).await.unwrap().body;
        assert_eq!(body, "Log\n\nfirst entry\nsecond entry\n");
    }

    #[tokio::test]
    async fn test_action_logger_over_doc_sink() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocs::new());
        let sink = DocSink::ensure(store.clone(), "Log").await.unwrap();
        let doc_id = sink.doc_id().to_string();
        let logger = ActionLogger::new(Arc::new(sink));

        logger
            .log_action("Chief of Staff", "Tool Called: calendar_list", "{}")
            .await;
        logger
            .log_conversation("Chief of Staff", "hello", "hi there")
            .await;

        let body = store.read(&doc_id).await.unwrap().body;
        let action_at = body.find("Tool Called: calendar_list").unwrap();
        let convo_at = body.find("Conversation Log").unwrap();
        assert!(action_at < convo_at);
    }

    #[tokio::test]
    async fn test_doc_tools_round_trip() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocs::new());

        let out = DocCreateTool::new(store.clone())
            .invoke(&json!({"title": "Notes"}))
            .await
            .unwrap();
        assert!(out.contains("created (ID: doc_"));

        let found = DocSearchTool::new(store.clone())
            .invoke(&json!({"title": "Notes"}))
            .await
            .unwrap();
        let doc_id = found
            .rsplit_once("(ID: ")
            .and_then(|(_, rest)| rest.strip_suffix(')'))
            .unwrap()
            .to_string();

        DocAppendTool::new(store.clone())
            .invoke(&json!({"doc_id": doc_id, "text": "Remember the milk."}))
            .await
            .unwrap();

        let read = DocReadTool::new(store.clone())
            .invoke(&json!({"doc_id": doc_id}))
            .await
            .unwrap();
        assert!(read.contains("Remember the milk."));
    }

    #[tokio::test]
    async fn test_missing_document_errors_as_text() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocs::new());
        let out = DocReadTool::new(store)
            .invoke(&json!({"doc_id": "doc_missing"}))
            .await
            .unwrap();
        assert!(out.starts_with("Error reading document:"));
    }
}
