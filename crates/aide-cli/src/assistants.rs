//! Assistant roster wiring.
//!
//! Builds the assistants with their instruction text, tool registries, and
//! iteration caps, all sharing one runner and one memory log. Instructions
//! are configuration data: the engine never interprets them.

use std::sync::Arc;

use tracing::warn;

use aide_agent::{
    ActionLogger, Assistant, ConsultTool, ModelClient, Runner, ThreadStore,
};
use aide_tools::{
    calendar_toolset, doc_toolset, mail_toolset, sheet_toolset, BusinessHours, DocSink,
    DocumentStore, InMemoryCalendar, InMemoryDocs, InMemoryMailbox, InMemorySheets,
    StaticSearchIndex, WebSearchTool,
};

/// Title of the shared memory log document.
pub const MEMORY_LOG_TITLE: &str = "Agent_Memory_Log";

/// Instructions for the Chief of Staff assistant.
pub const CHIEF_OF_STAFF_INSTRUCTIONS: &str = "\
You are an efficient Chief of Staff. You manage the user's time and communications.

Rules:
- Always check the calendar before proposing meetings, using calendar_list or calendar_search.
- Use calendar_get_current_time before interpreting relative dates like 'today' or 'tomorrow'.
- Events must fall inside business hours unless the user explicitly asks otherwise.
- If calendar_create_event reports a conflict, retry with the exact suggested times it returns.
- Only pass force_conflict=true when the user explicitly says to schedule anyway.
- Email drafts are created for review, never sent.
- For strategic questions ('Should we do X?', 'What am I missing?'), consult the Head of Strategy.
- Be concise. When a task needs several steps, execute them without asking permission, then summarize what you did.";

/// Instructions for the Head of Strategy assistant.
pub const STRATEGIST_INSTRUCTIONS: &str = "\
You are the Head of Strategy. You audit ideas and plans against the company's
strategy documents and current market information.

Rules:
- Ground every verdict in a document (doc_search, doc_read) or a web search.
- Answer with a clear 'Green light' or 'Red light' verdict followed by your reasoning.
- Name the risks the plan ignores; do not soften them.
- Be direct and brief.";

/// The assembled assistant roster, sharing one runner.
pub struct Roster {
    /// Shared runner (model client + conversation store + action log).
    pub runner: Arc<Runner>,

    /// Operational assistant: calendar, mail, sheets, consultation.
    pub chief_of_staff: Arc<Assistant>,

    /// Strategy assistant: documents and web search.
    pub strategist: Arc<Assistant>,
}

impl Roster {
    /// Look up an assistant by its CLI name.
    pub fn get(&self, name: &str) -> Option<&Arc<Assistant>> {
        match name {
            "chief-of-staff" => Some(&self.chief_of_staff),
            "strategist" => Some(&self.strategist),
            _ => None,
        }
    }

    /// CLI names of all assistants.
    pub fn names() -> &'static [&'static str] {
        &["chief-of-staff", "strategist"]
    }
}

/// Build the roster over the given model client, with in-memory demo
/// backends for every external service.
pub async fn build_roster(model: Arc<dyn ModelClient>) -> Roster {
    let docs: Arc<dyn DocumentStore> = Arc::new(InMemoryDocs::new());
    let logger = match DocSink::ensure(docs.clone(), MEMORY_LOG_TITLE).await {
        Ok(sink) => ActionLogger::new(Arc::new(sink)),
        Err(e) => {
            warn!("memory log unavailable, logging disabled: {e}");
            ActionLogger::disabled()
        }
    };
    let runner = Arc::new(Runner::new(model, ThreadStore::new(), logger));

    let calendar = Arc::new(InMemoryCalendar::new());
    let mailbox = Arc::new(InMemoryMailbox::new());
    let sheets = Arc::new(InMemorySheets::new());
    sheets
        .create(
            "prospects",
            vec!["Company".into(), "Website".into(), "Sector".into()],
        )
        .await;
    let search_index = Arc::new(StaticSearchIndex::default());

    let mut strategist = Assistant::new("Head of Strategy", STRATEGIST_INSTRUCTIONS)
        .with_max_rounds(25)
        .with_tool(WebSearchTool::new(search_index));
    for tool in doc_toolset(docs.clone()) {
        strategist = strategist.with_tool_arc(tool);
    }
    let strategist = Arc::new(strategist);

    let mut chief = Assistant::new("Chief of Staff", CHIEF_OF_STAFF_INSTRUCTIONS)
        .with_max_rounds(25)
        .with_tool(ConsultTool::new(
            "consult_head_of_strategy",
            "Consult the Head of Strategy for strategic questions, idea audits, \
             or plan critiques. Provide the question to present.",
            strategist.clone(),
            runner.clone(),
        ));
    for tool in calendar_toolset(calendar, BusinessHours::default()) {
        chief = chief.with_tool_arc(tool);
    }
    for tool in mail_toolset(mailbox) {
        chief = chief.with_tool_arc(tool);
    }
    for tool in sheet_toolset(sheets) {
        chief = chief.with_tool_arc(tool);
    }

    Roster {
        runner,
        chief_of_staff: Arc::new(chief),
        strategist,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aide_agent::{AgentError, Message, ModelConfig, ToolDefinition};
    use async_trait::async_trait;

    struct OfflineModel;

    #[async_trait]
    impl ModelClient for OfflineModel {
        async fn complete(
            &self,
            _config: &ModelConfig,
            _messages: &[Message],
            _tools: &[ToolDefinition],
        ) -> aide_agent::Result<Message> {
            Err(AgentError::ModelInvocation("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_roster_wiring() {
        let roster = build_roster(Arc::new(OfflineModel)).await;

        // Chief of Staff: 6 calendar + 3 mail + 2 sheet + 1 consult.
        assert_eq!(roster.chief_of_staff.registry().len(), 12);
        assert!(roster
            .chief_of_staff
            .registry()
            .get("consult_head_of_strategy")
            .is_some());
        assert!(roster
            .chief_of_staff
            .registry()
            .get("calendar_create_event")
            .is_some());

        // Strategist: 4 doc tools + web search, no calendar access.
        assert_eq!(roster.strategist.registry().len(), 5);
        assert!(roster.strategist.registry().get("web_search").is_some());
        assert!(roster.strategist.registry().get("calendar_list").is_none());

        assert!(roster.get("chief-of-staff").is_some());
        assert!(roster.get("strategist").is_some());
        assert!(roster.get("intern").is_none());
    }
}
