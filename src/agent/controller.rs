//! The think/act/observe controller loop.

use std::sync::Arc;

use crate::llm::{ChatMessage, LlmClient, LlmError};
use crate::tools::ToolRegistry;

use super::action::{parse_action, AgentAction, FINAL_ANSWER_ACTION};
use super::history::ChatHistory;

/// Answer returned when the iteration ceiling is reached without a final
/// answer. Degraded but never an exception.
const EXHAUSTED_ANSWER: &str =
    "I could not complete the request within the allowed number of reasoning steps. \
     Please try rephrasing or narrowing your question.";

/// Drives one user message through the reasoning loop.
///
/// The controller is bound to one immutable catalogue snapshot (baked into
/// its system prompt at construction) and one closed tool registry. It holds
/// no per-turn state: history lives in the session.
pub struct AgentController {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_iterations: usize,
}

impl AgentController {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        system_prompt: String,
        max_iterations: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            system_prompt,
            max_iterations,
        }
    }

    /// Run one user turn to completion.
    ///
    /// Never fails: tool problems become observations inside the loop, model
    /// noise triggers corrective retries, and an LLM transport failure is
    /// reported as an error-prefixed answer string.
    pub async fn run_turn(&self, history: &ChatHistory, user_input: &str) -> String {
        match self.run_loop(history, user_input).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Turn failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }

    async fn run_loop(&self, history: &ChatHistory, user_input: &str) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(history.recent().len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(history.recent().iter().cloned());
        messages.push(ChatMessage::user(user_input));

        for iteration in 0..self.max_iterations {
            tracing::debug!("Agent iteration {}", iteration + 1);

            let response = self.llm.complete(&messages).await?;
            messages.push(ChatMessage::assistant(response.clone()));

            match parse_action(&response) {
                Ok(AgentAction::FinalAnswer(answer)) => {
                    return Ok(answer);
                }
                Ok(AgentAction::ToolCall { name, input }) => match self.tools.get(&name) {
                    Some(tool) => {
                        tracing::info!("Dispatching tool: {}", name);
                        let observation = tool.invoke(input).await;
                        messages.push(ChatMessage::user(format!(
                            "Observation: {}",
                            observation.text
                        )));
                    }
                    None => {
                        // Unknown tool name is handled exactly like a parse
                        // failure: correct and retry within the ceiling.
                        tracing::warn!("Model requested unregistered tool: {}", name);
                        messages.push(ChatMessage::user(self.corrective_instruction(&format!(
                            "'{}' is not a valid tool.",
                            name
                        ))));
                    }
                },
                Err(e) => {
                    tracing::warn!("Unparsable model action: {}", e);
                    messages.push(
                        ChatMessage::user(
                            self.corrective_instruction("Your last response was not a valid action."),
                        ),
                    );
                }
            }
        }

        tracing::warn!(
            "Iteration ceiling ({}) reached without a final answer",
            self.max_iterations
        );
        Ok(EXHAUSTED_ANSWER.to_string())
    }

    fn corrective_instruction(&self, reason: &str) -> String {
        let tool_names = self
            .tools
            .names()
            .iter()
            .map(|n| format!("\"{}\"", n))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} Respond with a single valid JSON blob containing an \"action\" key and an \
             \"action_input\" key. Valid \"action\" values: \"{}\" or {}.",
            reason, FINAL_ANSWER_ACTION, tool_names
        )
    }
}
