//! API request and response types.

use serde::{Deserialize, Serialize};

/// Inbound chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,

    /// Discard this session's history and controller before answering
    #[serde(default)]
    pub reset_memory: bool,
}

/// Chat answer plus the session the caller should keep presenting.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

/// Outcome of a reset request.
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub instance: String,
    pub csv_file: String,
    pub search_depth: String,
    pub active_sessions: usize,
}

/// Diagnostic listing of live sessions.
#[derive(Debug, Clone, Serialize)]
pub struct SessionsResponse {
    pub active_sessions: usize,
    pub session_ids: Vec<String>,
    pub instance: String,
}
