//! Tool capability contract, registry, and dispatch.
//!
//! Every capability an assistant can exercise (calendar, mail, web search,
//! consulting another assistant) implements the same [`Tool`] trait and is
//! registered by name. Dispatch never raises: unknown tools and failed
//! invocations become error-flagged results the model can read and react to.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AgentError, Result};

/// A request from the model to execute one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier, scoped to the model response that requested it.
    pub id: String,

    /// Name of the tool to execute.
    pub name: String,

    /// JSON argument payload.
    pub arguments: Value,
}

impl ToolCall {
    /// Create a tool call with a freshly generated id.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: format!("call-{}", Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }

    /// Create a tool call with an explicit id (as received from the model).
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// The result of executing one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the tool call this result answers.
    pub tool_call_id: String,

    /// String output of the tool.
    pub content: String,

    /// Whether the invocation failed.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result.
    pub fn success(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error result.
    pub fn error(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

/// Schema advertised to the model for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name the model uses to request this tool.
    pub name: String,

    /// Description of what the tool does.
    pub description: String,

    /// JSON Schema for the argument payload.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Create a definition for a tool that takes no parameters.
    pub fn no_params(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(
            name,
            description,
            serde_json::json!({"type": "object", "properties": {}}),
        )
    }
}

/// Capability contract every tool implements.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The schema advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given JSON arguments.
    ///
    /// Errors are recoverable: the dispatcher renders them into an
    /// error-flagged [`ToolResult`] visible to the model.
    async fn invoke(&self, args: &Value) -> Result<String>;
}

/// Registry mapping tool names to instances for one assistant.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name its definition declares.
    /// Re-registering a name replaces the previous instance.
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.definition().name, Arc::new(tool));
    }

    /// Register an already shared tool instance.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.definition().name, tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Definitions of all registered tools, in name order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute one tool call, converting every failure into result text.
    ///
    /// Unknown tool names and invocation errors both come back as
    /// error-flagged results so the model can see and react to them.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            debug!(tool = %call.name, "dispatch of unregistered tool");
            return ToolResult::error(
                &call.id,
                AgentError::ToolNotFound(call.name.clone()).to_string(),
            );
        };

        match tool.invoke(&call.arguments).await {
            Ok(content) => ToolResult::success(&call.id, content),
            Err(e) => ToolResult::error(&call.id, e.to_string()),
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Get a required string field from a JSON argument payload.
pub fn require_str<'a>(args: &'a Value, key: &str) -> std::result::Result<&'a str, String> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(format!("argument '{key}' must be a string, got {other}")),
        None => Err(format!("missing required argument '{key}'")),
    }
}

/// Get an optional string field from a JSON argument payload.
pub fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Get an optional boolean field, defaulting to false.
pub fn optional_bool(args: &Value, key: &str) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Get an optional unsigned integer field.
pub fn optional_u64(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(
                "echo",
                "Echo the given text back",
                json!({
                    "type": "object",
                    "properties": {
                        "text": {"type": "string"}
                    },
                    "required": ["text"]
                }),
            )
        }

        async fn invoke(&self, args: &Value) -> Result<String> {
            let text = require_str(args, "text").map_err(|e| AgentError::InvalidArguments {
                tool_name: "echo".into(),
                message: e,
            })?;
            Ok(format!("echo: {text}"))
        }
    }

    #[test]
    fn test_tool_call_ids_unique() {
        let a = ToolCall::new("echo", json!({}));
        let b = ToolCall::new("echo", json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(EchoTool);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("other").is_none());

        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let call = ToolCall::new("echo", json!({"text": "hello"}));
        let result = registry.dispatch(&call).await;

        assert!(!result.is_error);
        assert_eq!(result.tool_call_id, call.id);
        assert_eq!(result.content, "echo: hello");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_not_an_error() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("summon_pony", json!({}));

        let result = registry.dispatch(&call).await;
        assert!(result.is_error);
        assert_eq!(result.content, "unknown tool: summon_pony");
    }

    #[tokio::test]
    async fn test_dispatch_invocation_error_becomes_text() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let call = ToolCall::new("echo", json!({}));
        let result = registry.dispatch(&call).await;

        assert!(result.is_error);
        assert!(result.content.contains("missing required argument 'text'"));
    }

    #[test]
    fn test_value_helpers() {
        let args = json!({"q": "rust", "force": true, "limit": 10});
        assert_eq!(require_str(&args, "q").unwrap(), "rust");
        assert!(require_str(&args, "force").is_err());
        assert_eq!(optional_str(&args, "q"), Some("rust"));
        assert_eq!(optional_str(&args, "absent"), None);
        assert!(optional_bool(&args, "force"));
        assert!(!optional_bool(&args, "absent"));
        assert_eq!(optional_u64(&args, "limit"), Some(10));
    }

    #[test]
    fn test_definition_no_params() {
        let def = ToolDefinition::no_params("current_time", "Get the current time");
        assert_eq!(def.name, "current_time");
        assert_eq!(def.parameters["type"], "object");
    }
}
