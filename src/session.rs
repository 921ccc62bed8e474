//! Session management: one agent controller plus rolling history per caller.
//!
//! The store is the only cross-request shared mutable state in the process.
//! Turns for a single session id are serialized through that session's async
//! mutex; distinct sessions proceed fully in parallel. Sessions are not
//! persistent: they live until reset, idle expiry, or process exit.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::agent::{build_system_prompt, AgentController, ChatHistory};
use crate::catalogue::DomainCatalogue;
use crate::llm::LlmClient;
use crate::tools::ToolRegistry;

/// One conversation: a controller bound to the catalogue snapshot and its
/// append-only history.
pub struct Session {
    controller: AgentController,
    history: ChatHistory,
}

impl Session {
    /// Run one user turn and record the exchange.
    pub async fn chat(&mut self, input: &str) -> String {
        let answer = self.controller.run_turn(&self.history, input).await;
        self.history.push_pair(input, answer.clone());
        answer
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// Shared handle to a session. The inner mutex is the per-key writer lock.
pub struct SessionHandle {
    id: Uuid,
    session: Mutex<Session>,
    last_active: StdMutex<Instant>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Serialize one chat turn against this session.
    pub async fn chat(&self, input: &str) -> String {
        let mut session = self.session.lock().await;
        *self.last_active.lock().unwrap() = Instant::now();
        session.chat(input).await
    }

    /// Lock the session for inspection (tests and diagnostics).
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, Session> {
        self.session.lock().await
    }

    fn idle_for(&self) -> Duration {
        self.last_active.lock().unwrap().elapsed()
    }
}

/// Maps session ids to live sessions; creates lazily, replaces on reset,
/// evicts after idle expiry.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    system_prompt: Arc<str>,
    max_iterations: usize,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        catalogue: &DomainCatalogue,
        max_iterations: usize,
        ttl: Duration,
    ) -> Self {
        let system_prompt = build_system_prompt(&catalogue.text, &catalogue.domains, &tools);
        Self {
            sessions: RwLock::new(HashMap::new()),
            llm,
            tools,
            system_prompt: system_prompt.into(),
            max_iterations,
            ttl,
        }
    }

    fn new_handle(&self, id: Uuid) -> Arc<SessionHandle> {
        let controller = AgentController::new(
            self.llm.clone(),
            self.tools.clone(),
            self.system_prompt.to_string(),
            self.max_iterations,
        );
        Arc::new(SessionHandle {
            id,
            session: Mutex::new(Session {
                controller,
                history: ChatHistory::new(),
            }),
            last_active: StdMutex::new(Instant::now()),
        })
    }

    /// Explicitly start a new session and return its handle.
    pub async fn begin(&self) -> Arc<SessionHandle> {
        let id = Uuid::new_v4();
        let handle = self.new_handle(id);
        self.sessions.write().await.insert(id, handle.clone());
        tracing::info!("New session created: {}", id);
        handle
    }

    /// Resolve an existing session, or create one when the id is absent,
    /// unknown, or `reset` is requested. A reset under a known id keeps the
    /// id but discards controller and history entirely.
    pub async fn get_or_create(&self, id: Option<Uuid>, reset: bool) -> Arc<SessionHandle> {
        self.sweep_expired().await;

        if let Some(id) = id {
            if !reset {
                if let Some(existing) = self.sessions.read().await.get(&id) {
                    return existing.clone();
                }
            }
            let handle = self.new_handle(id);
            if reset {
                tracing::info!("Memory reset for session: {}", id);
            } else {
                tracing::info!("New session created: {}", id);
            }
            self.sessions.write().await.insert(id, handle.clone());
            return handle;
        }

        self.begin().await
    }

    /// Discard a session entirely. Idempotent; returns whether one existed.
    pub async fn reset(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!("Session discarded: {}", id);
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.sweep_expired().await;
        self.sessions.read().await.len()
    }

    /// Active session ids, sorted for stable output.
    pub async fn list(&self) -> Vec<Uuid> {
        self.sweep_expired().await;
        let mut ids: Vec<Uuid> = self.sessions.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Drop sessions idle past the TTL. Called opportunistically on store
    /// access so memory stays bounded under many distinct callers.
    async fn sweep_expired(&self) {
        let has_expired = self
            .sessions
            .read()
            .await
            .values()
            .any(|handle| handle.idle_for() > self.ttl);
        if !has_expired {
            return;
        }

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| handle.idle_for() <= self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!("Evicted {} idle session(s)", evicted);
        }
    }
}
