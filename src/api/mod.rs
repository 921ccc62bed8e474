//! HTTP surface: chat, reset, health and session diagnostics.

pub mod types;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::config::Config;
use crate::session::SessionStore;

use types::{ChatRequest, ChatResponse, HealthResponse, ResetResponse, SessionsResponse};

const SESSION_COOKIE: &str = "session_id";
const SESSION_COOKIE_MAX_AGE_SECS: u64 = 3600;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub config: Arc<Config>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/reset", post(reset))
        .route("/health", get(health))
        .route("/sessions", get(sessions))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(config: Config, store: Arc<SessionStore>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        store,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Extract the caller's session id from the request cookies, if any.
/// An unparsable id is treated as absent (an explicit new-session request).
fn session_id_from_cookies(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Uuid::parse_str(value.trim()).ok()
        } else {
            None
        }
    })
}

fn session_cookie_header(id: Uuid) -> Result<HeaderValue, (StatusCode, String)> {
    HeaderValue::from_str(&format!(
        "{}={}; Max-Age={}; HttpOnly; Path=/",
        SESSION_COOKIE, id, SESSION_COOKIE_MAX_AGE_SECS
    ))
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Chat error: {}", e),
        )
    })
}

/// Chat endpoint with session affinity via cookie.
async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Response, (StatusCode, String)> {
    let session_id = session_id_from_cookies(&headers);
    let handle = state
        .store
        .get_or_create(session_id, request.reset_memory)
        .await;

    tracing::info!("Processing chat request for session: {}", handle.id());
    let answer = handle.chat(&request.message).await;

    let cookie = session_cookie_header(handle.id())?;
    let mut response = Json(ChatResponse {
        response: answer,
        session_id: handle.id().to_string(),
    })
    .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);

    Ok(response)
}

/// Drop the caller's session. Idempotent.
async fn reset(State(state): State<AppState>, headers: HeaderMap) -> Json<ResetResponse> {
    let message = match session_id_from_cookies(&headers) {
        Some(id) if state.store.reset(id).await => "Memory reset successfully",
        _ => "No active session to reset",
    };
    Json(ResetResponse {
        message: message.to_string(),
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        instance: state.config.instance_name.clone(),
        csv_file: state.config.csv_file_path.clone(),
        search_depth: state.config.search_depth.to_string(),
        active_sessions: state.store.count().await,
    })
}

async fn sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    let ids = state.store.list().await;
    Json(SessionsResponse {
        active_sessions: ids.len(),
        session_ids: ids.iter().map(Uuid::to_string).collect(),
        instance: state.config.instance_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::DomainCatalogue;
    use crate::llm::{ChatMessage, LlmClient, LlmError};
    use crate::tools::ToolRegistry;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::util::ServiceExt;

    struct FinalAnswerLlm;

    #[async_trait]
    impl LlmClient for FinalAnswerLlm {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            Ok(r#"{"action": "Final Answer", "action_input": "the answer"}"#.to_string())
        }
    }

    fn test_state() -> AppState {
        let config = Config::new("llm-key".to_string(), "search-key".to_string());
        let store = SessionStore::new(
            Arc::new(FinalAnswerLlm),
            Arc::new(ToolRegistry::new(vec![])),
            &DomainCatalogue::build(&[]),
            config.max_iterations,
            Duration::from_secs(config.session_ttl_secs),
        );
        AppState {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    fn chat_request(body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn chat_creates_session_and_sets_cookie() {
        let state = test_state();
        let response = router(state.clone())
            .oneshot(chat_request(r#"{"message": "hi"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie set")
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("session_id="));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.contains("HttpOnly"));

        let body = json_body(response).await;
        assert_eq!(body["response"], "the answer");
        assert!(!body["session_id"].as_str().unwrap().is_empty());
        assert_eq!(state.store.count().await, 1);
    }

    #[tokio::test]
    async fn chat_reuses_session_from_cookie() {
        let state = test_state();
        let app = router(state.clone());

        let first = app
            .clone()
            .oneshot(chat_request(r#"{"message": "one"}"#, None))
            .await
            .unwrap();
        let session_id = json_body(first).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let second = app
            .oneshot(chat_request(
                r#"{"message": "two"}"#,
                Some(&format!("session_id={}", session_id)),
            ))
            .await
            .unwrap();
        let body = json_body(second).await;

        assert_eq!(body["session_id"], session_id.as_str());
        assert_eq!(state.store.count().await, 1);
    }

    #[tokio::test]
    async fn reset_memory_flag_starts_clean_under_same_id() {
        let state = test_state();
        let app = router(state.clone());

        let first = app
            .clone()
            .oneshot(chat_request(r#"{"message": "one"}"#, None))
            .await
            .unwrap();
        let session_id = json_body(first).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let reset = app
            .oneshot(chat_request(
                r#"{"message": "two", "reset_memory": true}"#,
                Some(&format!("session_id={}", session_id)),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(reset).await["session_id"], session_id.as_str());

        // Reset then one exchange: history holds exactly that pair
        let handle = state
            .store
            .get_or_create(Some(session_id.parse().unwrap()), false)
            .await;
        assert_eq!(handle.lock().await.history_len(), 2);
    }

    #[tokio::test]
    async fn reset_endpoint_is_idempotent() {
        let state = test_state();
        let app = router(state.clone());

        let first = app
            .clone()
            .oneshot(chat_request(r#"{"message": "one"}"#, None))
            .await
            .unwrap();
        let session_id = json_body(first).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let reset = |cookie: String| {
            let app = app.clone();
            async move {
                let request = Request::builder()
                    .method("POST")
                    .uri("/reset")
                    .header("cookie", cookie)
                    .body(Body::empty())
                    .unwrap();
                json_body(app.oneshot(request).await.unwrap()).await
            }
        };

        let cookie = format!("session_id={}", session_id);
        assert_eq!(
            reset(cookie.clone()).await["message"],
            "Memory reset successfully"
        );
        assert_eq!(state.store.count().await, 0);
        assert_eq!(reset(cookie).await["message"], "No active session to reset");
    }

    #[tokio::test]
    async fn health_reports_instance_and_sessions() {
        let state = test_state();
        let app = router(state.clone());

        app.clone()
            .oneshot(chat_request(r#"{"message": "hi"}"#, None))
            .await
            .unwrap();

        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let body = json_body(app.oneshot(request).await.unwrap()).await;

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["instance"], "qa-agent");
        assert_eq!(body["csv_file"], "sites_data.csv");
        assert_eq!(body["search_depth"], "basic");
        assert_eq!(body["active_sessions"], 1);
    }

    #[tokio::test]
    async fn sessions_endpoint_lists_ids() {
        let state = test_state();
        let app = router(state.clone());

        let first = app
            .clone()
            .oneshot(chat_request(r#"{"message": "hi"}"#, None))
            .await
            .unwrap();
        let session_id = json_body(first).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let request = Request::builder()
            .method("GET")
            .uri("/sessions")
            .body(Body::empty())
            .unwrap();
        let body = json_body(app.oneshot(request).await.unwrap()).await;

        assert_eq!(body["active_sessions"], 1);
        assert_eq!(body["session_ids"][0], session_id.as_str());
    }

    #[tokio::test]
    async fn malformed_cookie_starts_a_new_session() {
        let state = test_state();
        let response = router(state.clone())
            .oneshot(chat_request(
                r#"{"message": "hi"}"#,
                Some("session_id=not-a-uuid"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.store.count().await, 1);
    }
}
