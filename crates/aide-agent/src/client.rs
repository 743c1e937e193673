//! Model provider client.
//!
//! The orchestration loop consumes the model as a black box behind the
//! [`ModelClient`] trait: a full message list plus the registry's tool
//! schemas go in, one assistant message (free text and/or tool-call
//! requests) comes out. [`OpenRouterClient`] is the concrete
//! chat-completions implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::ModelConfig;
use crate::error::{AgentError, Result};
use crate::message::{Message, MessageRole};
use crate::tool::{ToolCall, ToolDefinition};

/// Environment variable for the OpenRouter API key.
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// OpenRouter chat completions endpoint.
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Black-box model contract consumed by the orchestration loop.
///
/// A failure here is an infrastructure failure: it aborts the run and
/// propagates to the caller, unlike tool failures which stay inside the
/// conversation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Invoke the model with the full message list and available tool
    /// schemas; return its response as an assistant message.
    async fn complete(
        &self,
        config: &ModelConfig,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message>;
}

/// OpenRouter API client for chat completions with tool calling.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
}

impl OpenRouterClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create a client from the `OPENROUTER_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(OPENROUTER_API_KEY_ENV).map_err(|_| {
            AgentError::Configuration(format!(
                "missing {} environment variable",
                OPENROUTER_API_KEY_ENV
            ))
        })?;
        Ok(Self::new(api_key))
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        trace!("sending chat request: {:?}", request);

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::ModelInvocation(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::ModelInvocation(format!(
                "OpenRouter API error {status}: {text}"
            )));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParse(format!("failed to parse response: {e}")))?;

        debug!(
            "chat response received: {} tokens used",
            response.usage.as_ref().map_or(0, |u| u.total_tokens)
        );

        Ok(response)
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    async fn complete(
        &self,
        config: &ModelConfig,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message> {
        let request = ChatRequest {
            model: config.model.clone(),
            messages: messages.iter().map(ChatMessage::from_message).collect(),
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.iter().map(ChatTool::from_definition).collect())
            },
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
        };

        let response = self.chat(&request).await?;
        response.into_message()
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,

    /// Conversation messages.
    pub messages: Vec<ChatMessage>,

    /// Available tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatTool>>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A message in chat-completions wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: String,

    /// Text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool calls made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ChatToolCall>>,

    /// Tool call id for tool result messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Convert one domain message to wire format.
    pub fn from_message(msg: &Message) -> Self {
        match msg.role {
            MessageRole::System => Self {
                role: "system".into(),
                content: Some(msg.content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            MessageRole::User => Self {
                role: "user".into(),
                content: Some(msg.content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            MessageRole::Assistant => Self {
                role: "assistant".into(),
                content: (!msg.content.is_empty()).then(|| msg.content.clone()),
                tool_calls: msg.tool_calls.as_ref().map(|calls| {
                    calls.iter().map(ChatToolCall::from_tool_call).collect()
                }),
                tool_call_id: None,
            },
            MessageRole::Tool => Self {
                role: "tool".into(),
                content: Some(msg.content.clone()),
                tool_calls: None,
                tool_call_id: msg
                    .tool_result
                    .as_ref()
                    .map(|r| r.tool_call_id.clone()),
            },
        }
    }
}

/// Tool call in wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolCall {
    /// Unique identifier for this call.
    pub id: String,

    /// Type of the call (always "function").
    #[serde(rename = "type")]
    pub call_type: String,

    /// Function details.
    pub function: ChatToolFunction,
}

impl ChatToolCall {
    /// Convert from the domain tool-call type.
    pub fn from_tool_call(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            call_type: "function".into(),
            function: ChatToolFunction {
                name: call.name.clone(),
                arguments: serde_json::to_string(&call.arguments).unwrap_or_default(),
            },
        }
    }

    /// Convert to the domain tool-call type.
    pub fn to_tool_call(&self) -> Result<ToolCall> {
        let arguments: serde_json::Value = serde_json::from_str(&self.function.arguments)
            .map_err(|e| AgentError::ResponseParse(format!("invalid tool arguments JSON: {e}")))?;

        Ok(ToolCall::with_id(&self.id, &self.function.name, arguments))
    }
}

/// Function details inside a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolFunction {
    /// Name of the function.
    pub name: String,

    /// JSON-encoded arguments.
    pub arguments: String,
}

/// Tool schema in wire format.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTool {
    /// Type of the tool (always "function").
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function definition.
    pub function: ToolDefinition,
}

impl ChatTool {
    /// Wrap a domain tool definition for the wire.
    pub fn from_definition(def: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".into(),
            function: def.clone(),
        }
    }
}

/// Chat completion response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Unique identifier for this completion.
    pub id: String,

    /// Completion choices.
    pub choices: Vec<ChatChoice>,

    /// Token usage information.
    pub usage: Option<ChatUsage>,
}

impl ChatResponse {
    /// Convert the first choice into a domain assistant message.
    pub fn into_message(self) -> Result<Message> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::ResponseParse("response carried no choices".into()))?;

        let content = choice.message.content.unwrap_or_default();
        match choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => {
                let calls = calls
                    .iter()
                    .map(ChatToolCall::to_tool_call)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Message::assistant_with_tools(content, calls))
            }
            _ => Ok(Message::assistant(content)),
        }
    }
}

/// A choice in the completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// Index of this choice.
    pub index: u32,

    /// The message for this choice.
    pub message: ResponseMessage,

    /// Finish reason (stop, tool_calls, length, ...).
    pub finish_reason: Option<String>,
}

/// Message in a completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Role (always "assistant" for responses).
    pub role: String,

    /// Text content of the response.
    pub content: Option<String>,

    /// Tool calls the model wants to make.
    pub tool_calls: Option<Vec<ChatToolCall>>,
}

/// Token usage information.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,

    /// Tokens in the completion.
    pub completion_tokens: u32,

    /// Total tokens used.
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolResult;
    use serde_json::json;

    #[test]
    fn test_from_message_roles() {
        let system = ChatMessage::from_message(&Message::system("Be brief."));
        assert_eq!(system.role, "system");
        assert_eq!(system.content.as_deref(), Some("Be brief."));

        let user = ChatMessage::from_message(&Message::user("Hello"));
        assert_eq!(user.role, "user");

        let tool_msg = Message::tool(ToolResult::success("call-9", "3 events found"));
        let wire = ChatMessage::from_message(&tool_msg);
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id.as_deref(), Some("call-9"));
        assert_eq!(wire.content.as_deref(), Some("3 events found"));
    }

    #[test]
    fn test_assistant_tool_calls_round_trip() {
        let call = ToolCall::with_id("call-1", "calendar_list", json!({"max_results": 3}));
        let msg = Message::assistant_with_tools("", vec![call.clone()]);

        let wire = ChatMessage::from_message(&msg);
        assert_eq!(wire.role, "assistant");
        // Empty content is elided on the wire.
        assert!(wire.content.is_none());

        let wire_calls = wire.tool_calls.unwrap();
        assert_eq!(wire_calls.len(), 1);
        assert_eq!(wire_calls[0].function.name, "calendar_list");

        let back = wire_calls[0].to_tool_call().unwrap();
        assert_eq!(back, call);
    }

    #[test]
    fn test_chat_tool_from_definition() {
        let def = ToolDefinition::new(
            "web_search",
            "Search the web",
            json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            }),
        );

        let chat_tool = ChatTool::from_definition(&def);
        assert_eq!(chat_tool.tool_type, "function");
        assert_eq!(chat_tool.function.name, "web_search");

        let json = serde_json::to_value(&chat_tool).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "web_search");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "google/gemini-2.5-flash".into(),
            messages: vec![ChatMessage::from_message(&Message::user("Hi"))],
            tools: None,
            max_tokens: Some(4096),
            temperature: Some(0.7),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("gemini-2.5-flash"));
        assert!(!json.contains("tools"));
    }

    #[test]
    fn test_plain_response_into_message() {
        let json = r#"{
            "id": "gen-123",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Your afternoon is clear."
                },
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let msg = response.into_message().unwrap();
        assert!(msg.is_plain_assistant());
        assert_eq!(msg.content, "Your afternoon is clear.");
    }

    #[test]
    fn test_tool_call_response_into_message() {
        let json = r#"{
            "id": "gen-456",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call-1",
                        "type": "function",
                        "function": {
                            "name": "calendar_create_event",
                            "arguments": "{\"summary\": \"Standup\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": null
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let msg = response.into_message().unwrap();
        assert!(msg.has_tool_calls());
        let calls = msg.tool_calls.unwrap();
        assert_eq!(calls[0].name, "calendar_create_event");
        assert_eq!(calls[0].arguments["summary"], "Standup");
    }

    #[test]
    fn test_empty_choices_is_parse_error() {
        let response = ChatResponse {
            id: "gen-0".into(),
            choices: Vec::new(),
            usage: None,
        };
        assert!(matches!(
            response.into_message(),
            Err(AgentError::ResponseParse(_))
        ));
    }

    #[test]
    fn test_malformed_tool_arguments_is_parse_error() {
        let call = ChatToolCall {
            id: "call-1".into(),
            call_type: "function".into(),
            function: ChatToolFunction {
                name: "x".into(),
                arguments: "{not json".into(),
            },
        };
        assert!(matches!(
            call.to_tool_call(),
            Err(AgentError::ResponseParse(_))
        ));
    }
}
