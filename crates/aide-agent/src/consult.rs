//! Consultation bridge: one assistant's loop exposed as a tool for another.
//!
//! Each consultation runs on a freshly minted thread id, so nested calls
//! never see or pollute the parent's history. The call is synchronous: the
//! parent loop blocks until the consulted assistant's loop fully
//! terminates, and the consulted assistant's own round-trip cap bounds the
//! nested work independently of the parent's budget.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::assistant::Assistant;
use crate::error::Result;
use crate::runner::Runner;
use crate::thread::ThreadStore;
use crate::tool::{require_str, Tool, ToolDefinition};

/// Tool that forwards a question to another assistant and returns its
/// terminal response.
pub struct ConsultTool {
    tool_name: String,
    description: String,
    consulted: Arc<Assistant>,
    runner: Arc<Runner>,
}

impl ConsultTool {
    /// Expose `consulted` as a tool named `tool_name`.
    pub fn new(
        tool_name: impl Into<String>,
        description: impl Into<String>,
        consulted: Arc<Assistant>,
        runner: Arc<Runner>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            description: description.into(),
            consulted,
            runner,
        }
    }
}

#[async_trait]
impl Tool for ConsultTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            &self.tool_name,
            &self.description,
            json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The question or idea to present"
                    }
                },
                "required": ["question"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let question = match require_str(args, "question") {
            Ok(q) => q,
            Err(e) => return Ok(format!("Error consulting {}: {e}", self.consulted.name())),
        };

        // Fresh thread per consultation; never the parent's.
        let thread_id = ThreadStore::mint_id("consultation");
        info!(
            consulted = self.consulted.name(),
            %thread_id, "starting consultation"
        );

        match self.runner.run(&self.consulted, &thread_id, question).await {
            Ok(response) => Ok(format!(
                "{} Response:\n{response}",
                self.consulted.name()
            )),
            // The consulted assistant's infrastructure failure is, from the
            // parent's perspective, an ordinary tool failure.
            Err(e) => Ok(format!("Error consulting {}: {e}", self.consulted.name())),
        }
    }
}
