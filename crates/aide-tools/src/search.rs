//! Web search provider contract and tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use aide_agent::error::Result;
use aide_agent::tool::{optional_u64, require_str, Tool, ToolDefinition};

/// Errors from a search backend.
#[derive(Error, Debug)]
#[error("search service error: {0}")]
pub struct SearchError(pub String);

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Result title.
    pub title: String,

    /// Result URL.
    pub link: String,

    /// Short text snippet.
    pub snippet: String,
}

/// External search backend contract.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Top results for a query, at most `limit`.
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<SearchHit>, SearchError>;
}

/// Static index used by tests and the demo wiring: substring match over
/// title and snippet.
#[derive(Default)]
pub struct StaticSearchIndex {
    hits: Vec<SearchHit>,
}

impl StaticSearchIndex {
    /// Create an index over fixed hits.
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl SearchProvider for StaticSearchIndex {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<SearchHit>, SearchError> {
        let needle = query.to_lowercase();
        Ok(self
            .hits
            .iter()
            .filter(|h| {
                h.title.to_lowercase().contains(&needle)
                    || h.snippet.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Search the web and return titles, links, and snippets.
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    /// Create the tool over a search backend.
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "web_search",
            "Search the web for current information and return titles, links, \
             and snippets.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query"},
                    "num_results": {"type": "integer", "description": "Maximum results (default: 5)"}
                },
                "required": ["query"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let query = require_str(args, "query").map_err(|message| {
            aide_agent::AgentError::InvalidArguments {
                tool_name: "web_search".into(),
                message,
            }
        })?;
        let limit = optional_u64(args, "num_results").unwrap_or(5) as usize;

        match self.provider.search(query, limit).await {
            Ok(hits) if hits.is_empty() => Ok(format!("No results found for '{query}'")),
            Ok(hits) => {
                let lines: Vec<String> = hits
                    .iter()
                    .enumerate()
                    .map(|(i, h)| format!("{}. {}\n   {}\n   {}", i + 1, h.title, h.link, h.snippet))
                    .collect();
                Ok(format!(
                    "Found {} results for '{query}':\n{}",
                    lines.len(),
                    lines.join("\n")
                ))
            }
            Err(e) => Ok(format!("Error searching the web: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> Arc<StaticSearchIndex> {
        Arc::new(StaticSearchIndex::new(vec![
            SearchHit {
                title: "Rust 2024 edition".into(),
                link: "https://example.com/rust".into(),
                snippet: "What changed in the new edition".into(),
            },
            SearchHit {
                title: "Calendar APIs compared".into(),
                link: "https://example.com/cal".into(),
                snippet: "A survey of scheduling backends".into(),
            },
        ]))
    }

    #[tokio::test]
    async fn test_search_formats_results() {
        let tool = WebSearchTool::new(index());
        let out = tool.invoke(&json!({"query": "rust"})).await.unwrap();
        assert!(out.starts_with("Found 1 results for 'rust':"));
        assert!(out.contains("1. Rust 2024 edition"));
        assert!(out.contains("https://example.com/rust"));
    }

    #[tokio::test]
    async fn test_search_no_results() {
        let tool = WebSearchTool::new(index());
        let out = tool.invoke(&json!({"query": "ponies"})).await.unwrap();
        assert_eq!(out, "No results found for 'ponies'");
    }

    #[tokio::test]
    async fn test_limit_respected() {
        let hits = (0..10)
            .map(|i| SearchHit {
                title: format!("match {i}"),
                link: format!("https://example.com/{i}"),
                snippet: "match".into(),
            })
            .collect();
        let tool = WebSearchTool::new(Arc::new(StaticSearchIndex::new(hits)));

        let out = tool
            .invoke(&json!({"query": "match", "num_results": 3}))
            .await
            .unwrap();
        assert!(out.starts_with("Found 3 results"));
    }
}
