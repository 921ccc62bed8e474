//! Agent module - the reasoning loop behind each session.
//!
//! The controller follows a think/act/observe pattern:
//! 1. Build context from the domain catalogue, recent history and the question
//! 2. Ask the LLM for one structured action (a tool call or the final answer)
//! 3. Dispatch the action, feed the observation back
//! 4. Repeat until a final answer or the iteration ceiling

mod action;
mod controller;
mod history;
mod prompt;

pub use action::{parse_action, ActionParseError, AgentAction, FINAL_ANSWER_ACTION};
pub use controller::AgentController;
pub use history::ChatHistory;
pub use prompt::build_system_prompt;
