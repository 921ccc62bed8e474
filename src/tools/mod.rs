//! Tool capabilities available to the agent.
//!
//! Every tool exposes a stable name, a natural-language usage contract (the
//! model's only manual for the tool), a JSON schema for its input, and an
//! `invoke` operation. Invocation is total: argument problems, provider
//! errors and timeouts all come back as a textual [`Observation`], never as
//! an error crossing the controller boundary.

mod scrape;
mod search;

pub use scrape::{ChromiumRenderer, PageRenderer, RenderError, ScrapeTool};
pub use search::{SearchError, SearchProvider, SearchRecord, SearchTool, TavilyProvider};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// The text result of a tool invocation, fed back into the reasoning loop.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Name of the tool that produced this observation
    pub tool: String,
    /// Result text (or a description of the failure)
    pub text: String,
    /// Whether the content was cut at a configured cap
    pub truncated: bool,
}

impl Observation {
    pub fn new(tool: &str, text: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            text: text.into(),
            truncated: false,
        }
    }

    pub fn truncated(tool: &str, text: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            text: text.into(),
            truncated: true,
        }
    }
}

/// A capability the agent can dispatch to.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable identifier used in action dispatch.
    fn name(&self) -> &str;

    /// Usage contract consumed by the LLM. Must enumerate parameters, when
    /// to use the tool, and its limitations.
    fn description(&self) -> &str;

    /// JSON schema of the tool input.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool. Never fails: all errors are converted into a
    /// descriptive observation so the loop always has text to reason over.
    async fn invoke(&self, args: Value) -> Observation;
}

/// Closed lookup table of the available tools, keyed by stable name.
///
/// Built once at startup; action parsing validates tool names against this
/// set instead of trusting the model.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let by_name = tools
            .iter()
            .enumerate()
            .map(|(idx, tool)| (tool.name().to_string(), idx))
            .collect();
        Self { tools, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|idx| &self.tools[*idx])
    }

    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

/// Cut `text` at `max_chars`, backing up to a char boundary, and append the
/// marker. Returns the text unchanged when it fits.
pub(crate) fn truncate_with_marker(text: &str, max_chars: usize, marker: &str) -> (String, bool) {
    if text.len() <= max_chars {
        return (text.to_string(), false);
    }
    let mut idx = max_chars;
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    (format!("{}{}", &text[..idx], marker), true)
}
