//! Parsing of the structured action blob emitted by the model.
//!
//! Each reasoning step must yield exactly one JSON blob of the form
//! `{"action": <tool name or "Final Answer">, "action_input": <args or text>}`,
//! optionally wrapped in a fenced code block and surrounded by prose.

use serde_json::Value;
use thiserror::Error;

/// Sentinel action name that terminates the loop.
pub const FINAL_ANSWER_ACTION: &str = "Final Answer";

#[derive(Debug, Error)]
pub enum ActionParseError {
    #[error("no JSON object found in model output")]
    NoJson,

    #[error("invalid JSON action blob: {0}")]
    InvalidJson(String),

    #[error("action blob is missing a string 'action' field")]
    MissingAction,
}

/// One parsed model action.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    /// Invoke the named tool with the given input payload.
    ToolCall { name: String, input: Value },
    /// Terminate the turn with this answer text.
    FinalAnswer(String),
}

/// Extract and parse the first action blob from raw model output.
pub fn parse_action(output: &str) -> Result<AgentAction, ActionParseError> {
    let blob = extract_json_object(output).ok_or(ActionParseError::NoJson)?;

    let value: Value = serde_json::from_str(blob)
        .map_err(|e| ActionParseError::InvalidJson(e.to_string()))?;

    let action = value
        .get("action")
        .and_then(Value::as_str)
        .ok_or(ActionParseError::MissingAction)?
        .to_string();

    let input = value.get("action_input").cloned().unwrap_or(Value::Null);

    if action == FINAL_ANSWER_ACTION {
        let text = match input {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(AgentAction::FinalAnswer(text))
    } else {
        Ok(AgentAction::ToolCall {
            name: action,
            input,
        })
    }
}

/// Find the first balanced `{...}` object in the text, skipping over any
/// fence markers and prose. Braces inside JSON strings are accounted for.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
