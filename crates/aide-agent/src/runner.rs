//! The orchestration loop.
//!
//! Given a thread and a new user message, the runner alternates between
//! invoking the model and executing requested tools until the model returns
//! a plain response or the assistant's round-trip cap is hit. The cap is
//! the system's sole infinite-loop guard: a model that keeps requesting
//! tools cannot run unbounded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::assistant::Assistant;
use crate::client::ModelClient;
use crate::error::{AgentError, Result};
use crate::logger::ActionLogger;
use crate::message::{Message, MessageRole};
use crate::thread::ThreadStore;

/// Advisory wall-clock budget for one run. Measured after the loop returns;
/// it cannot interrupt a stuck loop.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(90);

/// Caller-owned cooperative cancellation flag.
///
/// Polled only at the suspension points between loop states; setting it
/// unwinds the current run with [`AgentError::Cancelled`]. Tool side
/// effects already performed are not undone.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress callback invoked with status strings at suspension points.
pub type ProgressFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Options for one run.
#[derive(Clone)]
pub struct RunOptions {
    /// Thread to run against; created on first use.
    pub thread_id: String,

    /// Cooperative cancellation token.
    pub cancel: Option<CancelToken>,

    /// Progress callback for status strings.
    pub progress: Option<ProgressFn>,

    /// Advisory wall-clock budget.
    pub time_budget: Duration,
}

impl RunOptions {
    /// Options for the given thread with the default time budget.
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            cancel: None,
            progress: None,
            time_budget: DEFAULT_TIME_BUDGET,
        }
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Override the advisory time budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }
}

/// Outcome of one completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Final response text.
    pub response: String,

    /// Tool round trips recorded during this run.
    pub round_trips: u32,

    /// Whether the round-trip cap forced termination.
    pub hit_cap: bool,

    /// Wall-clock time the run took.
    pub elapsed: Duration,

    /// Whether the run exceeded the advisory time budget.
    pub over_budget: bool,
}

/// Loop states. `Decide` inspects the last message of the thread and picks
/// the next transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Decide,
    ModelCall,
    ToolExec,
    Terminated,
}

/// Drives assistants: owns the model client, the conversation store, and
/// the action logger shared by every assistant in the roster.
pub struct Runner {
    model: Arc<dyn ModelClient>,
    threads: ThreadStore,
    logger: ActionLogger,
}

impl Runner {
    /// Create a runner.
    pub fn new(model: Arc<dyn ModelClient>, threads: ThreadStore, logger: ActionLogger) -> Self {
        Self {
            model,
            threads,
            logger,
        }
    }

    /// The conversation store backing this runner.
    pub fn threads(&self) -> &ThreadStore {
        &self.threads
    }

    /// Run one user message through the assistant's loop and return the
    /// final response text.
    pub async fn run(
        &self,
        assistant: &Assistant,
        thread_id: &str,
        user_text: &str,
    ) -> Result<String> {
        self.run_with(assistant, user_text, RunOptions::new(thread_id))
            .await
            .map(|report| report.response)
    }

    /// Run one user message with explicit options.
    pub async fn run_with(
        &self,
        assistant: &Assistant,
        user_text: &str,
        options: RunOptions,
    ) -> Result<RunReport> {
        let thread_id = options.thread_id.as_str();
        let cap = assistant.max_rounds();
        let started = Instant::now();

        info!(assistant = assistant.name(), thread_id, "run started");
        self.threads.append(thread_id, Message::user(user_text)).await;

        let mut rounds: u32 = 0;
        let mut hit_cap = false;
        let mut state = LoopState::Decide;

        while state != LoopState::Terminated {
            match state {
                LoopState::Decide => {
                    // Suspension point: the only place cancellation is
                    // observed and the counter is compared to the cap.
                    if let Some(cancel) = &options.cancel {
                        if cancel.is_cancelled() {
                            warn!(assistant = assistant.name(), thread_id, "run cancelled");
                            return Err(AgentError::Cancelled);
                        }
                    }

                    let next = match self.threads.last_message(thread_id).await {
                        None => LoopState::ModelCall,
                        Some(last) => match last.role {
                            MessageRole::Assistant if last.has_tool_calls() => LoopState::ToolExec,
                            MessageRole::Assistant => LoopState::Terminated,
                            _ => LoopState::ModelCall,
                        },
                    };

                    state = if next == LoopState::ToolExec && rounds >= cap {
                        hit_cap = true;
                        debug!(
                            assistant = assistant.name(),
                            thread_id, rounds, "round-trip cap reached, forcing termination"
                        );
                        LoopState::Terminated
                    } else {
                        next
                    };
                }

                LoopState::ModelCall => {
                    if let Some(progress) = &options.progress {
                        progress("Thinking...");
                    }

                    let history = self.threads.history(thread_id).await;
                    let outbound = Self::with_instructions(assistant, history);
                    trace!(
                        assistant = assistant.name(),
                        messages = outbound.len(),
                        "invoking model"
                    );

                    let reply = self
                        .model
                        .complete(
                            assistant.model(),
                            &outbound,
                            &assistant.registry().definitions(),
                        )
                        .await?;
                    self.threads.append(thread_id, reply).await;
                    state = LoopState::Decide;
                }

                LoopState::ToolExec => {
                    rounds += 1;
                    let calls = self
                        .threads
                        .last_message(thread_id)
                        .await
                        .and_then(|m| m.tool_calls)
                        .unwrap_or_default();

                    if let Some(progress) = &options.progress {
                        progress(&format!("Executing {} tool call(s)...", calls.len()));
                    }

                    for call in &calls {
                        self.logger
                            .log_action(
                                assistant.name(),
                                &format!("Tool Called: {}", call.name),
                                &call.arguments.to_string(),
                            )
                            .await;

                        let result = assistant.registry().dispatch(call).await;
                        self.threads.append(thread_id, Message::tool(result)).await;
                    }
                    state = LoopState::Decide;
                }

                LoopState::Terminated => unreachable!("loop exits before matching Terminated"),
            }
        }

        let response = self.terminal_response(thread_id).await;
        self.logger
            .log_conversation(assistant.name(), user_text, &response)
            .await;

        let elapsed = started.elapsed();
        let over_budget = elapsed > options.time_budget;
        if over_budget {
            warn!(
                assistant = assistant.name(),
                thread_id,
                ?elapsed,
                "run exceeded its advisory time budget"
            );
        }
        info!(assistant = assistant.name(), thread_id, rounds, "run finished");

        Ok(RunReport {
            response,
            round_trips: rounds,
            hit_cap,
            elapsed,
            over_budget,
        })
    }

    /// Build the outbound message list, prepending the assistant's
    /// instructions when the thread does not already start with a system
    /// message. The thread itself stays append-only; the instruction lives
    /// only in the invocation list.
    fn with_instructions(assistant: &Assistant, history: Vec<Message>) -> Vec<Message> {
        if history.first().is_some_and(|m| m.role == MessageRole::System) {
            return history;
        }
        let mut outbound = Vec::with_capacity(history.len() + 1);
        outbound.push(Message::system(assistant.instructions()));
        outbound.extend(history);
        outbound
    }

    /// The content of the most recent plain assistant message; if none
    /// exists (cap hit mid-tool-call), the content of the very last
    /// message, whatever its role.
    async fn terminal_response(&self, thread_id: &str) -> String {
        let history = self.threads.history(thread_id).await;

        if let Some(msg) = history.iter().rev().find(|m| m.is_plain_assistant()) {
            return msg.content.clone();
        }
        history
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "No response generated.".to_string())
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner").finish_non_exhaustive()
    }
}
