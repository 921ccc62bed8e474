//! Web scraping tool backed by headless Chromium.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::{truncate_with_marker, Observation, Tool};

pub const SCRAPE_TOOL_NAME: &str = "scrape_website";

const TRUNCATION_MARKER: &str = "\n\n... (content truncated)";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("render timed out after {0:?}")]
    Timeout(Duration),
}

/// Renders a URL to its post-JavaScript HTML.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, RenderError>;
}

/// Headless Chromium renderer. One browser per render call: scraping is the
/// rare path, and an always-on browser process is not worth the residency.
pub struct ChromiumRenderer {
    timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn render_inner(url: &str) -> Result<String, RenderError> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(RenderError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        // The handler stream must be drained for the CDP connection to make progress.
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let result = async {
            let page = browser
                .new_page(url)
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            page.content()
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))
        }
        .await;

        let _ = browser.close().await;
        handler_task.abort();

        result
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        tokio::time::timeout(self.timeout, Self::render_inner(url))
            .await
            .map_err(|_| RenderError::Timeout(self.timeout))?
    }
}

/// Default tags extracted when the caller does not ask for specific ones.
pub fn default_tags() -> Vec<String> {
    ["p", "li", "div", "a", "span", "h1", "h2", "h3", "h4", "h5", "h6"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

#[derive(Debug, Deserialize)]
struct ScrapeArgs {
    url: String,
    #[serde(default = "default_tags")]
    tags_to_extract: Vec<String>,
}

/// Scrape a page when search results are insufficient.
pub struct ScrapeTool {
    renderer: Arc<dyn PageRenderer>,
    max_content_length: usize,
}

impl ScrapeTool {
    pub fn new(renderer: Arc<dyn PageRenderer>, max_content_length: usize) -> Self {
        Self {
            renderer,
            max_content_length,
        }
    }

    async fn run(&self, args: ScrapeArgs) -> Observation {
        match url::Url::parse(&args.url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            _ => {
                return Observation::new(
                    SCRAPE_TOOL_NAME,
                    format!(
                        "Web scraping error for {}: URL must be absolute and start with http:// or https://",
                        args.url
                    ),
                );
            }
        }

        tracing::info!("Scraping: {} (tags: {:?})", args.url, args.tags_to_extract);

        let html = match self.renderer.render(&args.url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Scraping failed for {}: {}", args.url, e);
                return Observation::new(
                    SCRAPE_TOOL_NAME,
                    format!("Web scraping error for {}: {}", args.url, e),
                );
            }
        };

        if html.trim().is_empty() {
            return Observation::new(
                SCRAPE_TOOL_NAME,
                format!("Failed to load content from {}", args.url),
            );
        }

        let content = extract_tag_text(&html, &args.tags_to_extract);
        if content.is_empty() {
            return Observation::new(
                SCRAPE_TOOL_NAME,
                format!("No content extracted from {}", args.url),
            );
        }

        let (content, truncated) =
            truncate_with_marker(&content, self.max_content_length, TRUNCATION_MARKER);

        let text = format!(
            "**Website Scraped:** {}\n**Content Extracted:**\n\n{}\n",
            args.url, content
        );

        Observation {
            tool: SCRAPE_TOOL_NAME.to_string(),
            text,
            truncated,
        }
    }
}

/// Extract whitespace-normalized text from every element matching the
/// requested tags, in document order.
fn extract_tag_text(html: &str, tags: &[String]) -> String {
    let document = scraper::Html::parse_document(html);

    let selector = match scraper::Selector::parse(&tags.join(",")) {
        Ok(selector) => selector,
        // Bad tag names (e.g. "<div>") produce an unusable selector; treat
        // the extraction as empty rather than failing the tool.
        Err(_) => return String::new(),
    };

    let mut pieces: Vec<String> = Vec::new();
    for element in document.select(&selector) {
        let text: String = element.text().collect::<Vec<_>>().join(" ");
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !normalized.is_empty() {
            pieces.push(normalized);
        }
    }

    pieces.join(" ")
}

#[async_trait]
impl Tool for ScrapeTool {
    fn name(&self) -> &str {
        SCRAPE_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Scrape complete website content using a headless Chromium browser for comprehensive page extraction.\n\
         \n\
         REQUIRED PARAMETERS:\n\
         - url (string): Complete URL to scrape (must include https:// or http://)\n\
         \n\
         OPTIONAL PARAMETERS:\n\
         - tags_to_extract (list): HTML tags to extract content from.\n\
           Default: ['p', 'li', 'div', 'a', 'span', 'h1', 'h2', 'h3', 'h4', 'h5', 'h6']\n\
           Custom examples: ['pre', 'code'] for code examples, ['table', 'tr', 'td'] for tables\n\
         \n\
         WHEN TO USE:\n\
         - Search results are incomplete or insufficient\n\
         - Need complete page content including code examples\n\
         - Page has dynamic JavaScript content that search missed\n\
         \n\
         LIMITATIONS:\n\
         - Content truncated at configured limit to prevent excessive token usage\n\
         - Some sites may block automated scraping\n\
         - 3-10x slower than search_documentation: always try search first and\n\
           reserve scraping for when search is inadequate, choosing the most\n\
           relevant URL from previous search results"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "URL to scrape (absolute, with scheme)"
                },
                "tags_to_extract": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "HTML tags to extract"
                }
            },
            "required": ["url"]
        })
    }

    async fn invoke(&self, args: Value) -> Observation {
        match serde_json::from_value::<ScrapeArgs>(args) {
            Ok(args) => self.run(args).await,
            Err(e) => Observation::new(
                SCRAPE_TOOL_NAME,
                format!("Web scraping error: invalid arguments: {}", e),
            ),
        }
    }
}
