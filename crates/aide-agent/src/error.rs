//! Error types for the orchestration engine.

use thiserror::Error;

/// Errors that can occur while running an assistant.
///
/// Only infrastructure failures surface here. Anything the model can react
/// to on its next turn (bad tool arguments, unknown tools, rejected
/// calendar requests) is rendered into tool-result text by the dispatcher
/// instead of being raised.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Tool not found in the registry.
    #[error("unknown tool: {0}")]
    ToolNotFound(String),

    /// Invalid tool arguments.
    #[error("invalid arguments for {tool_name}: {message}")]
    InvalidArguments {
        /// Name of the tool.
        tool_name: String,
        /// Error message.
        message: String,
    },

    /// Model invocation failed (provider unreachable or errored).
    /// Aborts the whole run; messages already appended remain valid.
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    /// The model's response could not be parsed.
    #[error("failed to parse model response: {0}")]
    ResponseParse(String),

    /// The caller cancelled the run via its cancellation token.
    #[error("run cancelled by caller")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::InvalidArguments {
            tool_name: "calendar_create_event".into(),
            message: "missing required argument 'summary'".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid arguments for calendar_create_event: missing required argument 'summary'"
        );

        let err = AgentError::ToolNotFound("summon_pony".into());
        assert_eq!(err.to_string(), "unknown tool: summon_pony");

        let err = AgentError::Cancelled;
        assert_eq!(err.to_string(), "run cancelled by caller");
    }
}
