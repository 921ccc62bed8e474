//! Best-effort condensing of raw search output.

use std::sync::Arc;

use super::{ChatMessage, LlmClient};

/// Condenses search results relative to the query through a secondary LLM
/// call. Strictly best-effort: a broken summarizer never blocks the search
/// path, the raw text just passes through.
#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Condense `search_results` with respect to `original_query`.
    ///
    /// Returns the model's text, or the input unchanged if the call fails.
    pub async fn condense(&self, search_results: &str, original_query: &str) -> String {
        let prompt = summary_prompt(search_results, original_query);

        match self.llm.complete(&[ChatMessage::user(prompt)]).await {
            Ok(summary) => {
                tracing::info!(
                    "Summarized search results: {} -> {} chars",
                    search_results.len(),
                    summary.len()
                );
                summary
            }
            Err(e) => {
                tracing::warn!("Summarization failed: {}. Returning original results.", e);
                search_results.to_string()
            }
        }
    }
}

fn summary_prompt(search_results: &str, original_query: &str) -> String {
    format!(
        r#"You are a technical documentation summarizer. Your job is to extract and summarize only the most relevant information from search results.

Original User Query: "{original_query}"

Search Results to Summarize:
{search_results}

Instructions:
1. Focus ONLY on information directly relevant to answering the user's query
2. Remove redundant content, boilerplate text, and navigation elements
3. Preserve specific technical details, code examples, and step-by-step instructions
4. Maintain source URLs for attribution
5. Keep the summary comprehensive but concise
6. Format clearly for easy reading

Relevant Summary:
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;

    struct FixedLlm(String);

    #[async_trait]
    impl LlmClient for FixedLlm {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            Ok(self.0.clone())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            Err(LlmError::Transport("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn returns_model_text_on_success() {
        let summarizer = Summarizer::new(Arc::new(FixedLlm("condensed".to_string())));
        let out = summarizer.condense("long raw results", "query").await;
        assert_eq!(out, "condensed");
    }

    #[tokio::test]
    async fn falls_back_to_input_on_failure() {
        let summarizer = Summarizer::new(Arc::new(FailingLlm));
        let out = summarizer.condense("long raw results", "query").await;
        assert_eq!(out, "long raw results");
    }

    #[tokio::test]
    async fn prompt_carries_query_and_results() {
        let prompt = summary_prompt("RESULTS BLOCK", "how do agents work");
        assert!(prompt.contains("RESULTS BLOCK"));
        assert!(prompt.contains("how do agents work"));
    }
}
