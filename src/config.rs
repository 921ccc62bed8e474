//! Configuration management for the Q&A agent.
//!
//! Configuration is read from environment variables:
//! - `OPENAI_API_KEY` - Required. LLM provider API key.
//! - `TAVILY_API_KEY` - Required. Search provider API key.
//! - `LLM_MODEL` - Optional. Chat model identifier. Defaults to `gpt-4o-mini`.
//! - `LLM_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.1`.
//! - `LLM_MAX_TOKENS` - Optional. Max output tokens per completion. Defaults to `3000`.
//! - `LLM_TIMEOUT` - Optional. LLM call timeout in seconds. Defaults to `60`.
//! - `REQUEST_TIMEOUT` - Optional. Tool call timeout in seconds. Defaults to `30`.
//! - `MAX_RESULTS` - Optional. Default search result count. Defaults to `10`.
//! - `SEARCH_DEPTH` - Optional. `basic` or `advanced`. Defaults to `basic`.
//! - `MAX_CONTENT_SIZE` - Optional. Chars kept per search result. Defaults to `10000`.
//! - `MAX_SCRAPE_LENGTH` - Optional. Chars kept per scraped page. Defaults to `20000`.
//! - `ENABLE_SEARCH_SUMMARIZATION` - Optional. Defaults to `false`.
//! - `MAX_ITERATIONS` - Optional. Agent loop ceiling. Defaults to `10`.
//! - `SESSION_TTL_SECS` - Optional. Idle session lifetime. Defaults to `3600`.
//! - `CSV_FILE_PATH` - Optional. Knowledge source table. Defaults to `sites_data.csv`.
//! - `INSTANCE_NAME` - Optional. Reported by /health. Defaults to `qa-agent`.
//! - `HOST` / `PORT` - Optional. Bind address. Default `0.0.0.0:8000`.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Search depth passed through to the search provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDepth {
    Basic,
    Advanced,
}

impl SearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }

    /// Parse a depth value, falling back to `Basic` on anything unrecognized.
    pub fn parse_or_basic(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "basic" => SearchDepth::Basic,
            "advanced" => SearchDepth::Advanced,
            other => {
                tracing::warn!("Invalid SEARCH_DEPTH '{}', using default: basic", other);
                SearchDepth::Basic
            }
        }
    }
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM provider API key
    pub openai_api_key: String,

    /// Search provider API key
    pub tavily_api_key: String,

    /// Chat model identifier
    pub llm_model: String,

    /// Sampling temperature
    pub llm_temperature: f64,

    /// Max output tokens per completion
    pub llm_max_tokens: u32,

    /// LLM call timeout in seconds
    pub llm_timeout_secs: u64,

    /// Per tool call timeout in seconds
    pub request_timeout_secs: u64,

    /// Default number of search results
    pub max_results: usize,

    /// Default search depth
    pub search_depth: SearchDepth,

    /// Max characters retained per search result
    pub max_content_size: usize,

    /// Max characters retained per scraped page
    pub max_scrape_length: usize,

    /// Whether search results are condensed through a second LLM call
    pub enable_search_summarization: bool,

    /// Maximum reason/act/observe cycles per user turn
    pub max_iterations: usize,

    /// Idle seconds before a session is evicted
    pub session_ttl_secs: u64,

    /// Path to the knowledge source table
    pub csv_file_path: String,

    /// Instance name reported by /health
    pub instance_name: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if either API key is not set.
    /// Invalid optional values log a warning and fall back to the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let tavily_api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("TAVILY_API_KEY".to_string()))?;

        let llm_model =
            std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let search_depth = SearchDepth::parse_or_basic(
            &std::env::var("SEARCH_DEPTH").unwrap_or_else(|_| "basic".to_string()),
        );

        let csv_file_path =
            std::env::var("CSV_FILE_PATH").unwrap_or_else(|_| "sites_data.csv".to_string());
        let instance_name =
            std::env::var("INSTANCE_NAME").unwrap_or_else(|_| "qa-agent".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(Self {
            openai_api_key,
            tavily_api_key,
            llm_model,
            llm_temperature: env_f64("LLM_TEMPERATURE", 0.1),
            llm_max_tokens: env_u64("LLM_MAX_TOKENS", 3000) as u32,
            llm_timeout_secs: env_u64("LLM_TIMEOUT", 60),
            request_timeout_secs: env_u64("REQUEST_TIMEOUT", 30),
            max_results: env_u64("MAX_RESULTS", 10) as usize,
            search_depth,
            max_content_size: env_u64("MAX_CONTENT_SIZE", 10000) as usize,
            max_scrape_length: env_u64("MAX_SCRAPE_LENGTH", 20000) as usize,
            enable_search_summarization: env_bool("ENABLE_SEARCH_SUMMARIZATION", false),
            max_iterations: env_u64("MAX_ITERATIONS", 10) as usize,
            session_ttl_secs: env_u64("SESSION_TTL_SECS", 3600),
            csv_file_path,
            instance_name,
            host,
            port: env_u64("PORT", 8000) as u16,
        })
    }

    /// Create a config with fixed values (useful for testing).
    pub fn new(openai_api_key: String, tavily_api_key: String) -> Self {
        Self {
            openai_api_key,
            tavily_api_key,
            llm_model: "gpt-4o-mini".to_string(),
            llm_temperature: 0.1,
            llm_max_tokens: 3000,
            llm_timeout_secs: 60,
            request_timeout_secs: 30,
            max_results: 10,
            search_depth: SearchDepth::Basic,
            max_content_size: 10000,
            max_scrape_length: 20000,
            enable_search_summarization: false,
            max_iterations: 10,
            session_ttl_secs: 3600,
            csv_file_path: "sites_data.csv".to_string(),
            instance_name: "qa-agent".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Parse an integer env var, warning and using the default on bad input.
fn env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value '{}', using default: {}", key, value, default);
            default
        }),
        Err(_) => default,
    }
}

/// Parse a float env var, warning and using the default on bad input.
fn env_f64(key: &str, default: f64) -> f64 {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value '{}', using default: {}", key, value, default);
            default
        }),
        Err(_) => default,
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "t" | "yes" | "y" | "on"
        ),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_depth_falls_back_to_basic() {
        assert_eq!(SearchDepth::parse_or_basic("advanced"), SearchDepth::Advanced);
        assert_eq!(SearchDepth::parse_or_basic("Basic"), SearchDepth::Basic);
        assert_eq!(SearchDepth::parse_or_basic("turbo"), SearchDepth::Basic);
        assert_eq!(SearchDepth::parse_or_basic(""), SearchDepth::Basic);
    }

    #[test]
    fn config_defaults() {
        let config = Config::new("llm-key".to_string(), "search-key".to_string());
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.max_results, 10);
        assert_eq!(config.max_content_size, 10000);
        assert_eq!(config.max_scrape_length, 20000);
        assert_eq!(config.search_depth, SearchDepth::Basic);
        assert!(!config.enable_search_summarization);
    }
}
