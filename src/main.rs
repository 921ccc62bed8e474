//! Domain Q&A Agent - HTTP server entry point.

use std::sync::Arc;
use std::time::Duration;

use domain_qa_agent::api;
use domain_qa_agent::catalogue::{load_knowledge_sources, DomainCatalogue};
use domain_qa_agent::config::Config;
use domain_qa_agent::llm::{OpenAiClient, Summarizer};
use domain_qa_agent::session::SessionStore;
use domain_qa_agent::tools::{
    ChromiumRenderer, ScrapeTool, SearchTool, TavilyProvider, Tool, ToolRegistry,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "domain_qa_agent=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded for instance: {} (search depth: {}, max results: {})",
        config.instance_name, config.search_depth, config.max_results
    );

    // Load knowledge sources and build the catalogue
    let sources = load_knowledge_sources(&config.csv_file_path)?;
    let catalogue = DomainCatalogue::build(&sources);
    info!(
        "Loaded {} knowledge sources across {} domains from {}",
        sources.len(),
        catalogue.domains.len(),
        config.csv_file_path
    );

    let http = reqwest::Client::new();

    let llm = Arc::new(OpenAiClient::new(
        http.clone(),
        config.openai_api_key.clone(),
        config.llm_model.clone(),
        config.llm_temperature,
        config.llm_max_tokens,
        Duration::from_secs(config.llm_timeout_secs),
    ));

    let summarizer = if config.enable_search_summarization {
        info!("Search result summarization enabled");
        Some(Summarizer::new(llm.clone()))
    } else {
        None
    };

    let search_provider = Arc::new(TavilyProvider::new(
        http,
        config.tavily_api_key.clone(),
        Duration::from_secs(config.request_timeout_secs),
    ));
    let renderer = Arc::new(ChromiumRenderer::new(Duration::from_secs(
        config.request_timeout_secs,
    )));

    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(SearchTool::new(
            search_provider,
            summarizer,
            config.max_results,
            config.search_depth,
            config.max_content_size,
        )),
        Arc::new(ScrapeTool::new(renderer, config.max_scrape_length)),
    ];

    let store = Arc::new(SessionStore::new(
        llm,
        Arc::new(ToolRegistry::new(tools)),
        &catalogue,
        config.max_iterations,
        Duration::from_secs(config.session_ttl_secs),
    ));

    info!("Starting server on {}:{}", config.host, config.port);
    api::serve(config, store).await
}
