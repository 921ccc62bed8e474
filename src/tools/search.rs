//! Domain-restricted documentation search tool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::SearchDepth;
use crate::llm::Summarizer;

use super::{truncate_with_marker, Observation, Tool};

pub const SEARCH_TOOL_NAME: &str = "search_documentation";

const NO_RESULTS_MESSAGE: &str =
    "No results found. Try a different search query or check if domains are accessible.";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(String),

    #[error("search provider returned HTTP {0}")]
    Status(u16),
}

/// One search hit as returned by the provider.
#[derive(Debug, Clone)]
pub struct SearchRecord {
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
}

/// A web search provider restricted to an explicit site list.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query restricted to `sites`. The restriction is part of the
    /// contract: no result outside `sites` may be returned.
    async fn search(
        &self,
        query: &str,
        sites: &[String],
        max_results: usize,
        depth: SearchDepth,
    ) -> Result<Vec<SearchRecord>, SearchError>;
}

/// Tavily search API client.
#[derive(Clone)]
pub struct TavilyProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl TavilyProvider {
    pub fn new(client: reqwest::Client, api_key: String, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            endpoint: "https://api.tavily.com/search".to_string(),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: Option<String>,
    title: Option<String>,
    content: Option<String>,
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    async fn search(
        &self,
        query: &str,
        sites: &[String],
        max_results: usize,
        depth: SearchDepth,
    ) -> Result<Vec<SearchRecord>, SearchError> {
        let body = json!({
            "query": query,
            "max_results": max_results,
            "search_depth": depth.as_str(),
            "include_domains": sites,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let parsed: TavilySearchResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| SearchRecord {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect())
    }
}

/// Tool input. `sites` is mandatory and non-empty; the defaults for
/// `max_results` and `depth` come from configuration.
#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    sites: Vec<String>,
    max_results: Option<usize>,
    depth: Option<String>,
}

/// Search documentation sites through the configured provider.
pub struct SearchTool {
    provider: Arc<dyn SearchProvider>,
    summarizer: Option<Summarizer>,
    default_max_results: usize,
    default_depth: SearchDepth,
    max_content_size: usize,
}

impl SearchTool {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        summarizer: Option<Summarizer>,
        default_max_results: usize,
        default_depth: SearchDepth,
        max_content_size: usize,
    ) -> Self {
        Self {
            provider,
            summarizer,
            default_max_results,
            default_depth,
            max_content_size,
        }
    }

    async fn run(&self, args: SearchArgs) -> Observation {
        if args.sites.is_empty() {
            return Observation::new(
                SEARCH_TOOL_NAME,
                "Search error: 'sites' must list at least one domain to search within.",
            );
        }

        let max_results = args.max_results.unwrap_or(self.default_max_results);
        let depth = args
            .depth
            .as_deref()
            .map(SearchDepth::parse_or_basic)
            .unwrap_or(self.default_depth);

        tracing::info!(
            "Searching: '{}' on sites: {:?} (max_results={}, depth={})",
            args.query,
            args.sites,
            max_results,
            depth
        );

        let records = match self
            .provider
            .search(&args.query, &args.sites, max_results, depth)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Search error: {}", e);
                return Observation::new(SEARCH_TOOL_NAME, format!("Search error: {}", e));
            }
        };

        if records.is_empty() {
            tracing::warn!("No search results returned for '{}'", args.query);
            return Observation::new(SEARCH_TOOL_NAME, NO_RESULTS_MESSAGE);
        }

        let (formatted, any_truncated) =
            format_search_results(&records[..records.len().min(max_results)], self.max_content_size);

        let text = if let Some(summarizer) = &self.summarizer {
            summarizer.condense(&formatted, &args.query).await
        } else {
            formatted
        };

        Observation {
            tool: SEARCH_TOOL_NAME.to_string(),
            text,
            truncated: any_truncated,
        }
    }
}

/// Render result records into the fixed text block format.
fn format_search_results(records: &[SearchRecord], max_content_size: usize) -> (String, bool) {
    let mut blocks = Vec::with_capacity(records.len());
    let mut any_truncated = false;

    for (i, record) in records.iter().enumerate() {
        let title = record.title.as_deref().unwrap_or("No title");
        let url = record.url.as_deref().unwrap_or("No URL");
        let content = record.content.as_deref().unwrap_or("No content available");

        let (content, truncated) = truncate_with_marker(content, max_content_size, "...");
        any_truncated |= truncated;

        blocks.push(format!(
            "\nResult {}:\nTitle: {}\nURL: {}\nContent: {}\n---\n",
            i + 1,
            title,
            url,
            content
        ));
    }

    (blocks.join("\n"), any_truncated)
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search documentation websites using web search.\n\
         \n\
         REQUIRED PARAMETERS:\n\
         - query (string): Search query with relevant keywords - what you want to find\n\
         - sites (list): Website domains to search within (e.g., ['docs.langchain.com', 'fastapi.tiangolo.com'])\n\
         \n\
         OPTIONAL PARAMETERS:\n\
         - max_results (integer): Maximum number of search results to return\n\
         - depth (string): Search depth - 'basic' for quick searches or 'advanced' for comprehensive searches\n\
         \n\
         Usage Guidelines:\n\
         1. Create keyword-rich search query from user's question\n\
         2. Select relevant website domains based on technologies mentioned\n\
         3. Use 'basic' depth for quick answers, 'advanced' for thorough research\n\
         4. Adjust max_results based on how comprehensive you need the answer to be\n\
         \n\
         Best Practices:\n\
         - Include technical terms and framework names in queries\n\
         - Choose appropriate domains for the question context\n\
         - Use specific queries rather than broad terms for better results\n\
         - Prefer this tool over scrape_website: it is much faster"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query with relevant keywords"
                },
                "sites": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Website domains to search within (e.g., ['docs.langchain.com'])"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum results to return"
                },
                "depth": {
                    "type": "string",
                    "enum": ["basic", "advanced"],
                    "description": "Search depth: 'basic' or 'advanced'"
                }
            },
            "required": ["query", "sites"]
        })
    }

    async fn invoke(&self, args: Value) -> Observation {
        match serde_json::from_value::<SearchArgs>(args) {
            Ok(args) => self.run(args).await,
            Err(e) => Observation::new(
                SEARCH_TOOL_NAME,
                format!("Search error: invalid arguments: {}", e),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, LlmClient, LlmError};
    use std::sync::Mutex;

    /// Provider double that records the restriction it was called with.
    struct RecordingProvider {
        records: Vec<SearchRecord>,
        calls: Mutex<Vec<(String, Vec<String>, usize, SearchDepth)>>,
    }

    impl RecordingProvider {
        fn with_records(records: Vec<SearchRecord>) -> Self {
            Self {
                records,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for RecordingProvider {
        async fn search(
            &self,
            query: &str,
            sites: &[String],
            max_results: usize,
            depth: SearchDepth,
        ) -> Result<Vec<SearchRecord>, SearchError> {
            self.calls.lock().unwrap().push((
                query.to_string(),
                sites.to_vec(),
                max_results,
                depth,
            ));
            Ok(self.records.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl SearchProvider for FailingProvider {
        async fn search(
            &self,
            _query: &str,
            _sites: &[String],
            _max_results: usize,
            _depth: SearchDepth,
        ) -> Result<Vec<SearchRecord>, SearchError> {
            Err(SearchError::Transport("connection reset".to_string()))
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            Err(LlmError::Transport("boom".to_string()))
        }
    }

    fn record(title: &str, url: &str, content: &str) -> SearchRecord {
        SearchRecord {
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            content: Some(content.to_string()),
        }
    }

    fn tool_with(provider: Arc<dyn SearchProvider>, max_content_size: usize) -> SearchTool {
        SearchTool::new(provider, None, 10, SearchDepth::Basic, max_content_size)
    }

    #[tokio::test]
    async fn passes_site_restriction_to_provider() {
        let provider = Arc::new(RecordingProvider::with_records(vec![record(
            "T", "https://docs.foo.com/a", "body",
        )]));
        let tool = tool_with(provider.clone(), 10000);

        tool.invoke(json!({
            "query": "custom tools",
            "sites": ["docs.foo.com"],
            "depth": "advanced",
            "max_results": 3
        }))
        .await;

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (query, sites, max_results, depth) = &calls[0];
        assert_eq!(query, "custom tools");
        assert_eq!(sites, &vec!["docs.foo.com".to_string()]);
        assert_eq!(*max_results, 3);
        assert_eq!(*depth, SearchDepth::Advanced);
    }

    #[tokio::test]
    async fn empty_results_yield_no_results_message() {
        let provider = Arc::new(RecordingProvider::with_records(vec![]));
        let tool = tool_with(provider, 10000);

        let obs = tool
            .invoke(json!({"query": "xyz123", "sites": ["docs.foo.com"]}))
            .await;

        assert_eq!(obs.text, NO_RESULTS_MESSAGE);
        assert!(!obs.truncated);
    }

    #[tokio::test]
    async fn provider_error_becomes_observation() {
        let tool = tool_with(Arc::new(FailingProvider), 10000);
        let obs = tool
            .invoke(json!({"query": "q", "sites": ["docs.foo.com"]}))
            .await;
        assert!(obs.text.starts_with("Search error:"));
        assert!(obs.text.contains("connection reset"));
    }

    #[tokio::test]
    async fn empty_sites_rejected_without_provider_call() {
        let provider = Arc::new(RecordingProvider::with_records(vec![]));
        let tool = tool_with(provider.clone(), 10000);

        let obs = tool.invoke(json!({"query": "q", "sites": []})).await;
        assert!(obs.text.starts_with("Search error:"));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn long_content_is_truncated_with_marker() {
        let provider = Arc::new(RecordingProvider::with_records(vec![record(
            "T",
            "https://docs.foo.com/a",
            &"x".repeat(200),
        )]));
        let tool = tool_with(provider, 50);

        let obs = tool
            .invoke(json!({"query": "q", "sites": ["docs.foo.com"]}))
            .await;

        assert!(obs.truncated);
        assert!(obs.text.contains(&format!("{}...", "x".repeat(50))));
        assert!(!obs.text.contains(&"x".repeat(51)));
    }

    #[tokio::test]
    async fn result_blocks_carry_title_url_and_content() {
        let provider = Arc::new(RecordingProvider::with_records(vec![
            record("First", "https://docs.foo.com/1", "alpha"),
            record("Second", "https://docs.foo.com/2", "beta"),
        ]));
        let tool = tool_with(provider, 10000);

        let obs = tool
            .invoke(json!({"query": "q", "sites": ["docs.foo.com"]}))
            .await;

        assert!(obs.text.contains("Result 1:"));
        assert!(obs.text.contains("Title: First"));
        assert!(obs.text.contains("URL: https://docs.foo.com/1"));
        assert!(obs.text.contains("Content: alpha"));
        assert!(obs.text.contains("Result 2:"));
        assert!(obs.text.contains("---"));
    }

    #[tokio::test]
    async fn missing_fields_render_placeholders() {
        let provider = Arc::new(RecordingProvider::with_records(vec![SearchRecord {
            title: None,
            url: None,
            content: None,
        }]));
        let tool = tool_with(provider, 10000);

        let obs = tool
            .invoke(json!({"query": "q", "sites": ["docs.foo.com"]}))
            .await;

        assert!(obs.text.contains("Title: No title"));
        assert!(obs.text.contains("URL: No URL"));
        assert!(obs.text.contains("Content: No content available"));
    }

    #[tokio::test]
    async fn broken_summarizer_falls_back_to_uncompressed_text() {
        let provider = Arc::new(RecordingProvider::with_records(vec![record(
            "T", "https://docs.foo.com/a", "body",
        )]));
        let summarizer = Summarizer::new(Arc::new(FailingLlm));
        let tool = SearchTool::new(provider, Some(summarizer), 10, SearchDepth::Basic, 10000);

        let obs = tool
            .invoke(json!({"query": "q", "sites": ["docs.foo.com"]}))
            .await;

        // Summarization failure is invisible: the formatted block comes through
        assert!(obs.text.contains("Title: T"));
        assert!(obs.text.contains("Content: body"));
    }

    #[tokio::test]
    async fn malformed_arguments_become_observation() {
        let tool = tool_with(Arc::new(FailingProvider), 10000);
        let obs = tool.invoke(json!({"sites": ["docs.foo.com"]})).await;
        assert!(obs.text.contains("invalid arguments"));
    }
}
