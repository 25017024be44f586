//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the registry of live chat sessions.

use crate::config::Config;
use issuezz_core::{
    ports::{AiGateway, GithubService},
    Assistant, ChatSession, GithubFetcher, GuidanceFlow, MentorFlow,
};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::info;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Serves the `/api/*` endpoints. Absent when no completion provider is configured.
    pub assistant: Option<Arc<Assistant>>,
    pub mentor: MentorFlow,
    pub guidance: GuidanceFlow,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Wires both chat flows over `github` and `gateway`.
    pub fn new(
        config: Arc<Config>,
        github: Arc<dyn GithubService>,
        assistant: Option<Arc<Assistant>>,
        gateway: Arc<dyn AiGateway>,
    ) -> Self {
        let fetcher = GithubFetcher::new(github.clone(), config.issue_fetch_policy);
        Self {
            mentor: MentorFlow::new(fetcher, gateway.clone(), config.context_window),
            guidance: GuidanceFlow::new(github, gateway, config.context_window),
            assistant,
            sessions: SessionRegistry::new(config.session_idle_ttl),
            config,
        }
    }
}

//=========================================================================================
// SessionRegistry (Live Chat Sessions)
//=========================================================================================

/// One live session. `turn` serializes user turns; `session` is only locked long
/// enough to copy the transcript out or write the finished turn back, so reads never
/// wait on a model call.
pub struct SessionSlot {
    turn: Mutex<()>,
    session: Mutex<ChatSession>,
    last_active: std::sync::Mutex<Instant>,
}

impl SessionSlot {
    fn new(session: ChatSession) -> Self {
        Self {
            turn: Mutex::new(()),
            session: Mutex::new(session),
            last_active: std::sync::Mutex::new(Instant::now()),
        }
    }

    /// Waits for any running turn of this session to finish.
    pub async fn begin_turn(&self) -> MutexGuard<'_, ()> {
        let guard = self.turn.lock().await;
        self.touch();
        guard
    }

    pub async fn snapshot(&self) -> ChatSession {
        self.touch();
        self.session.lock().await.clone()
    }

    /// Stores the outcome of a turn. Call while holding the `begin_turn` guard.
    pub async fn commit(&self, session: ChatSession) {
        *self.session.lock().await = session;
        self.touch();
    }

    fn touch(&self) {
        *self
            .last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    fn in_turn(&self) -> bool {
        self.turn.try_lock().is_err()
    }
}

/// In-memory map of chat sessions. Sessions idle longer than `idle_ttl` are dropped
/// by [`SessionRegistry::evict_idle`]; a zero TTL keeps them until deleted.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Arc<SessionSlot>>>>,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub async fn insert(&self, session: ChatSession) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .write()
            .await
            .insert(id, Arc::new(SessionSlot::new(session)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<SessionSlot>> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Ends a session; `false` if it was unknown.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    /// Drops every session idle past the TTL, skipping those mid-turn. Returns how
    /// many were dropped.
    pub async fn evict_idle(&self) -> usize {
        if self.idle_ttl.is_zero() {
            return 0;
        }
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| slot.in_turn() || slot.idle_for() < self.idle_ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle sessions", evicted);
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuezz_core::session::{FlowContext, MentorContext};
    use issuezz_core::skills::SkillsProfile;
    use issuezz_core::ContextWindow;

    fn session() -> ChatSession {
        ChatSession::new(
            FlowContext::Mentor(MentorContext {
                data: Default::default(),
                skills: SkillsProfile::default(),
            }),
            ContextWindow::Full,
        )
    }

    #[tokio::test]
    async fn removed_sessions_are_gone() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let id = registry.insert(session()).await;
        assert!(registry.remove(id).await);
        assert!(registry.get(id).await.is_none());
        assert!(!registry.remove(id).await);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_unless_mid_turn() {
        let registry = SessionRegistry::new(Duration::from_millis(20));
        let idle = registry.insert(session()).await;
        let busy = registry.insert(session()).await;
        let busy_slot = registry.get(busy).await.unwrap();
        let _turn = busy_slot.begin_turn().await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        let fresh = registry.insert(session()).await;

        assert_eq!(registry.evict_idle().await, 1);
        assert!(registry.get(idle).await.is_none());
        assert!(registry.get(busy).await.is_some());
        assert!(registry.get(fresh).await.is_some());
    }

    #[tokio::test]
    async fn zero_ttl_never_evicts() {
        let registry = SessionRegistry::new(Duration::ZERO);
        registry.insert(session()).await;
        assert_eq!(registry.evict_idle().await, 0);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn snapshots_do_not_wait_for_a_running_turn() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let id = registry.insert(session()).await;
        let slot = registry.get(id).await.unwrap();
        let _turn = slot.begin_turn().await;

        let read = tokio::time::timeout(Duration::from_secs(1), slot.snapshot()).await;
        assert!(read.is_ok());
    }
}
