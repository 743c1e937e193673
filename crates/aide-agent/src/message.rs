//! Conversation message types.
//!
//! Messages are immutable once appended to a thread: the orchestration loop
//! only ever appends, never rewrites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::{ToolCall, ToolResult};

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (assistant instructions).
    System,
    /// User message.
    User,
    /// Assistant message.
    Assistant,
    /// Tool result message.
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// A single message in a conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender.
    pub role: MessageRole,

    /// Text content of the message. May be empty for assistant messages
    /// that only carry tool calls.
    pub content: String,

    /// Timestamp when the message was created.
    pub timestamp: DateTime<Utc>,

    /// Tool calls requested by the assistant (Assistant role only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Tool result, carrying the id of the call it answers (Tool role only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResult>,
}

impl Message {
    /// Create a new message with the current timestamp.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            tool_calls: None,
            tool_result: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a plain assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create an assistant message carrying tool-call requests.
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            tool_calls: Some(tool_calls),
            tool_result: None,
        }
    }

    /// Create a tool result message answering one tool call.
    pub fn tool(result: ToolResult) -> Self {
        Self {
            role: MessageRole::Tool,
            content: result.content.clone(),
            timestamp: Utc::now(),
            tool_calls: None,
            tool_result: Some(result),
        }
    }

    /// Check if this message carries tool-call requests.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }

    /// Check if this is a plain assistant message (terminal for the loop).
    pub fn is_plain_assistant(&self) -> bool {
        self.role == MessageRole::Assistant && !self.has_tool_calls()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_role_display() {
        assert_eq!(MessageRole::System.to_string(), "system");
        assert_eq!(MessageRole::User.to_string(), "user");
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
        assert_eq!(MessageRole::Tool.to_string(), "tool");
    }

    #[test]
    fn test_message_constructors() {
        let system = Message::system("You are a chief of staff.");
        assert_eq!(system.role, MessageRole::System);
        assert_eq!(system.content, "You are a chief of staff.");

        let user = Message::user("Schedule a meeting tomorrow");
        assert_eq!(user.role, MessageRole::User);

        let assistant = Message::assistant("Done.");
        assert!(assistant.is_plain_assistant());
        assert!(!assistant.has_tool_calls());
    }

    #[test]
    fn test_message_with_tools() {
        let call = ToolCall::new("calendar_list", json!({"max_results": 5}));
        let msg = Message::assistant_with_tools("Checking the calendar.", vec![call]);

        assert!(msg.has_tool_calls());
        assert!(!msg.is_plain_assistant());
        assert_eq!(msg.tool_calls.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_tool_message() {
        let result = ToolResult::success("call-7", "No events found");
        let msg = Message::tool(result);

        assert_eq!(msg.role, MessageRole::Tool);
        assert_eq!(msg.content, "No events found");
        assert_eq!(msg.tool_result.as_ref().unwrap().tool_call_id, "call-7");
    }

    #[test]
    fn test_empty_tool_calls_is_plain() {
        let msg = Message::assistant_with_tools("All done.", Vec::new());
        assert!(msg.is_plain_assistant());
    }

    #[test]
    fn test_serialization_round_trip() {
        let msg = Message::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();

        assert_eq!(msg.role, parsed.role);
        assert_eq!(msg.content, parsed.content);
    }
}
