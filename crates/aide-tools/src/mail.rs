//! Mail service contract and tools. Drafts only: nothing here ever sends.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use aide_agent::error::Result;
use aide_agent::tool::{require_str, Tool, ToolDefinition};

/// Errors from a mail backend.
#[derive(Error, Debug)]
pub enum MailError {
    /// No message with the given id.
    #[error("message not found: {0}")]
    NotFound(String),

    /// The backend failed.
    #[error("mail service error: {0}")]
    Service(String),
}

/// An email message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Backend-assigned identifier.
    pub id: String,

    /// Sender address.
    pub from: String,

    /// Recipient address.
    pub to: String,

    /// Subject line.
    pub subject: String,

    /// Full body text.
    pub body: String,
}

impl EmailMessage {
    /// First line of the body, truncated for listings.
    pub fn snippet(&self) -> String {
        let first_line = self.body.lines().next().unwrap_or_default();
        let snippet: String = first_line.chars().take(80).collect();
        snippet
    }
}

/// External mail backend contract.
#[async_trait]
pub trait MailService: Send + Sync {
    /// Messages whose subject or body contains the query (case-insensitive).
    async fn search(&self, query: &str) -> std::result::Result<Vec<EmailMessage>, MailError>;

    /// Fetch a full message by id.
    async fn read(&self, message_id: &str) -> std::result::Result<EmailMessage, MailError>;

    /// Create a draft and return its id. Never sends.
    async fn create_draft(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> std::result::Result<String, MailError>;
}

/// In-memory mailbox used by tests and the demo wiring.
#[derive(Default)]
pub struct InMemoryMailbox {
    messages: RwLock<Vec<EmailMessage>>,
    drafts: RwLock<Vec<EmailMessage>>,
}

impl InMemoryMailbox {
    /// Create an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a received message.
    pub async fn deliver(&self, from: &str, subject: &str, body: &str) -> EmailMessage {
        let msg = EmailMessage {
            id: mint_id("msg"),
            from: from.to_string(),
            to: "me".to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        self.messages.write().await.push(msg.clone());
        msg
    }

    /// Snapshot of drafts created so far.
    pub async fn drafts(&self) -> Vec<EmailMessage> {
        self.drafts.read().await.clone()
    }
}

fn mint_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &suffix[..12])
}

#[async_trait]
impl MailService for InMemoryMailbox {
    async fn search(&self, query: &str) -> std::result::Result<Vec<EmailMessage>, MailError> {
        let needle = query.to_lowercase();
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| {
                m.subject.to_lowercase().contains(&needle)
                    || m.body.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn read(&self, message_id: &str) -> std::result::Result<EmailMessage, MailError> {
        self.messages
            .read()
            .await
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .ok_or_else(|| MailError::NotFound(message_id.to_string()))
    }

    async fn create_draft(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> std::result::Result<String, MailError> {
        let draft = EmailMessage {
            id: mint_id("draft"),
            from: "me".to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        let id = draft.id.clone();
        self.drafts.write().await.push(draft);
        Ok(id)
    }
}

/// Search the inbox.
pub struct MailSearchTool {
    mail: Arc<dyn MailService>,
}

impl MailSearchTool {
    /// Create the tool over a mail backend.
    pub fn new(mail: Arc<dyn MailService>) -> Self {
        Self { mail }
    }
}

#[async_trait]
impl Tool for MailSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "mail_search",
            "Search email messages by query (matches subject and body).",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query"}
                },
                "required": ["query"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let query = require_str(args, "query").map_err(invalid_args("mail_search"))?;
        match self.mail.search(query).await {
            Ok(messages) if messages.is_empty() => {
                Ok(format!("No messages found matching '{query}'"))
            }
            Ok(messages) => {
                let lines: Vec<String> = messages
                    .iter()
                    .map(|m| {
                        format!(
                            "- {} (ID: {}, From: {}): {}",
                            m.subject,
                            m.id,
                            m.from,
                            m.snippet()
                        )
                    })
                    .collect();
                Ok(format!(
                    "Found {} messages:\n{}",
                    lines.len(),
                    lines.join("\n")
                ))
            }
            Err(e) => Ok(format!("Error searching mail: {e}")),
        }
    }
}

/// Read one message in full.
pub struct MailReadTool {
    mail: Arc<dyn MailService>,
}

impl MailReadTool {
    /// Create the tool over a mail backend.
    pub fn new(mail: Arc<dyn MailService>) -> Self {
        Self { mail }
    }
}

#[async_trait]
impl Tool for MailReadTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "mail_read",
            "Read a full email message by id. Find ids with mail_search first.",
            json!({
                "type": "object",
                "properties": {
                    "message_id": {"type": "string", "description": "Id of the message"}
                },
                "required": ["message_id"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let message_id = require_str(args, "message_id").map_err(invalid_args("mail_read"))?;
        match self.mail.read(message_id).await {
            Ok(m) => Ok(format!(
                "From: {}\nTo: {}\nSubject: {}\n\n{}",
                m.from, m.to, m.subject, m.body
            )),
            Err(e) => Ok(format!("Error reading message: {e}")),
        }
    }
}

/// Create an email draft for the user to review and send.
pub struct MailDraftTool {
    mail: Arc<dyn MailService>,
}

impl MailDraftTool {
    /// Create the tool over a mail backend.
    pub fn new(mail: Arc<dyn MailService>) -> Self {
        Self { mail }
    }
}

#[async_trait]
impl Tool for MailDraftTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "mail_draft",
            "Create an email draft. The draft is saved for the user to review \
             and send; it is never sent automatically.",
            json!({
                "type": "object",
                "properties": {
                    "to": {"type": "string", "description": "Recipient email address"},
                    "subject": {"type": "string", "description": "Subject line"},
                    "body": {"type": "string", "description": "Message body"}
                },
                "required": ["to", "subject", "body"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let to = require_str(args, "to").map_err(invalid_args("mail_draft"))?;
        let subject = require_str(args, "subject").map_err(invalid_args("mail_draft"))?;
        let body = require_str(args, "body").map_err(invalid_args("mail_draft"))?;

        match self.mail.create_draft(to, subject, body).await {
            Ok(draft_id) => Ok(format!(
                "✓ Draft created (ID: {draft_id}) to {to} with subject '{subject}'. \
                 It is ready for review; it has not been sent."
            )),
            Err(e) => Ok(format!("Error creating draft: {e}")),
        }
    }
}

/// All mail tools over one backend, ready for registration.
pub fn mail_toolset(mail: Arc<dyn MailService>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(MailSearchTool::new(mail.clone())),
        Arc::new(MailReadTool::new(mail.clone())),
        Arc::new(MailDraftTool::new(mail)),
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

    #[tokio::test]
    async fn test_search_and_read() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let delivered = mailbox
            .deliver("cfo@example.com", "Q4 budget", "Numbers attached.\nDetails below.")
            .await;

        let search = MailSearchTool::new(mailbox.clone());
        let out = search.invoke(&json!({"query": "budget"})).await.unwrap();
        assert!(out.contains("Found 1 messages:"));
        assert!(out.contains("Q4 budget"));
        assert!(out.contains("Numbers attached."));

        let read = MailReadTool::new(mailbox.clone());
        let out = read
            .invoke(&json!({"message_id": delivered.id}))
            .await
            .unwrap();
        assert!(out.contains("From: cfo@example.com"));
        assert!(out.contains("Details below."));
    }

    #[tokio::test]
    async fn test_search_no_match() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let out = MailSearchTool::new(mailbox)
            .invoke(&json!({"query": "unicorns"}))
            .await
            .unwrap();
        assert_eq!(out, "No messages found matching 'unicorns'");
    }

    #[tokio::test]
    async fn test_draft_is_saved_not_sent() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let tool = MailDraftTool::new(mailbox.clone());

        let out = tool
            .invoke(&json!({
                "to": "ceo@example.com",
                "subject": "Weekly summary",
                "body": "All on track."
            }))
            .await
            .unwrap();
        assert!(out.contains("✓ Draft created (ID: draft_"));
        assert!(out.contains("has not been sent"));

        let drafts = mailbox.drafts().await;
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].to, "ceo@example.com");
    }

    #[tokio::test]
    async fn test_read_unknown_message() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let out = MailReadTool::new(mailbox)
            .invoke(&json!({"message_id": "msg_missing"}))
            .await
            .unwrap();
        assert!(out.starts_with("Error reading message:"));
    }
}
