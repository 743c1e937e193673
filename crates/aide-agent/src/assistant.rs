//! Assistant definitions.
//!
//! An assistant is a name, an instruction string, a tool registry, a model
//! binding, and an iteration cap. The instruction text is externally
//! supplied configuration data; nothing in the engine interprets it.

use std::sync::Arc;

use crate::config::ModelConfig;
use crate::tool::{Tool, ToolRegistry};

/// Default round-trip cap. Assistants doing heavy research raise it
/// (observed range 25-60 across the roster).
pub const DEFAULT_MAX_ROUNDS: u32 = 25;

/// A fixed assistant definition.
#[derive(Debug, Clone)]
pub struct Assistant {
    /// Display name, used for logging.
    name: String,

    /// Opaque instruction text prepended as the system message.
    instructions: String,

    /// Model binding.
    model: ModelConfig,

    /// Tools available to this assistant.
    registry: ToolRegistry,

    /// Maximum model-tool round trips per run.
    max_rounds: u32,
}

impl Assistant {
    /// Create an assistant with the default model binding and cap.
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: ModelConfig::default(),
            registry: ToolRegistry::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Set the model binding.
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    /// Register a tool.
    pub fn with_tool<T>(mut self, tool: T) -> Self
    where
        T: Tool + 'static,
    {
        self.registry.register(tool);
        self
    }

    /// Register an already shared tool instance.
    pub fn with_tool_arc(mut self, tool: Arc<dyn Tool>) -> Self {
        self.registry.register_arc(tool);
        self
    }

    /// Set the round-trip cap.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// The assistant's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The instruction text.
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// The model binding.
    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// The tool registry.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The round-trip cap.
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::tool::ToolDefinition;
    use async_trait::async_trait;
    use serde_json::Value;

    struct NoopTool;

    #[async_trait]
    impl crate::tool::Tool for NoopTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::no_params("noop", "Do nothing")
        }

        async fn invoke(&self, _args: &Value) -> Result<String> {
            Ok("ok".into())
        }
    }

    #[test]
    fn test_assistant_defaults() {
        let assistant = Assistant::new("Chief of Staff", "You manage the user's time.");
        assert_eq!(assistant.name(), "Chief of Staff");
        assert_eq!(assistant.instructions(), "You manage the user's time.");
        assert_eq!(assistant.max_rounds(), DEFAULT_MAX_ROUNDS);
        assert!(assistant.registry().is_empty());
    }

    #[test]
    fn test_assistant_builder() {
        let assistant = Assistant::new("Prospector", "Research companies.")
            .with_model(ModelConfig::claude_sonnet())
            .with_tool(NoopTool)
            .with_max_rounds(40);

        assert_eq!(assistant.model().model, "anthropic/claude-sonnet-4");
        assert_eq!(assistant.registry().len(), 1);
        assert_eq!(assistant.max_rounds(), 40);
    }
}
