//! Browser sessions
//!
//! Each browser (identified by cookie) gets its own orchestrator, auth state
//! and library cache. Sessions live in memory and are dropped once idle for
//! longer than the configured timeout, or when the registry is full and a
//! new browser arrives (least recently seen first).

use crate::library::LibraryCache;
use crate::orchestrator::{Orchestrator, Screen};
use crate::services::{PersistenceService, PredictionService};
use chrono::Utc;
use cropai_common::config::SessionsConfig;
use cropai_common::events::{CropEvent, EventBus};
use cropai_common::models::AuthSession;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

/// Bounds on the session registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Time without a request before a session is dropped
    pub idle_timeout: Duration,
    /// Live sessions kept before the least recently seen is dropped
    pub max_sessions: usize,
    /// Period of the background idle sweep
    pub sweep_interval: Duration,
}

impl From<SessionsConfig> for SessionLimits {
    fn from(cfg: SessionsConfig) -> Self {
        Self {
            idle_timeout: Duration::from_secs(cfg.idle_timeout_secs),
            max_sessions: cfg.max_sessions.max(1),
            sweep_interval: Duration::from_secs(cfg.sweep_interval_secs.max(1)),
        }
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        SessionsConfig::default().into()
    }
}

pub struct Session {
    id: Uuid,
    orchestrator: Orchestrator,
    auth: RwLock<Option<AuthSession>>,
    library: LibraryCache,
    events: EventBus,
    last_seen: Mutex<Instant>,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When this session last served a request
    pub fn last_seen(&self) -> Instant {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn library(&self) -> &LibraryCache {
        &self.library
    }

    /// Signed-in user, if any
    pub async fn auth(&self) -> Option<AuthSession> {
        self.auth.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.auth.read().await.is_some()
    }

    /// Store the signed-in user
    pub async fn sign_in(&self, session: AuthSession) {
        info!("Session {} signed in as {}", self.id, session.user.id);
        *self.auth.write().await = Some(session);
        self.emit_auth_changed(true);
    }

    /// Forget the signed-in user and leave account-only screens
    pub async fn sign_out(&self) -> Option<AuthSession> {
        let previous = self.auth.write().await.take();
        if previous.is_some() {
            info!("Session {} signed out", self.id);
            if self.orchestrator.snapshot().await.active_screen == Screen::Dashboard {
                self.orchestrator.show(Screen::Analyze).await;
            }
            self.emit_auth_changed(false);
        }
        previous
    }

    fn emit_auth_changed(&self, signed_in: bool) {
        self.events.emit_lossy(CropEvent::AuthChanged {
            session_id: self.id,
            signed_in,
            timestamp: Utc::now(),
        });
    }
}

/// All live sessions, keyed by cookie id
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
    predictor: Arc<dyn PredictionService>,
    store: Arc<dyn PersistenceService>,
    events: EventBus,
    limits: SessionLimits,
}

impl SessionRegistry {
    pub fn new(
        predictor: Arc<dyn PredictionService>,
        store: Arc<dyn PersistenceService>,
        events: EventBus,
        limits: SessionLimits,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            predictor,
            store,
            events,
            limits,
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    /// Live session for `id`, marked as seen now
    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(&id).cloned()?;
        session.touch();
        Some(session)
    }

    /// Create a session and load its history once
    ///
    /// When the registry is full the least recently seen session is
    /// dropped to make room.
    pub async fn create(&self) -> Arc<Session> {
        let id = Uuid::new_v4();
        let session = Arc::new(Session {
            id,
            orchestrator: Orchestrator::new(
                id,
                self.predictor.clone(),
                self.store.clone(),
                self.events.clone(),
            ),
            auth: RwLock::new(None),
            library: LibraryCache::new(),
            events: self.events.clone(),
            last_seen: Mutex::new(Instant::now()),
        });

        session.orchestrator.load_history().await;

        let mut sessions = self.sessions.write().await;
        while sessions.len() >= self.limits.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_seen())
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    sessions.remove(&oldest);
                    info!(
                        "Session limit {} reached, dropped least recently seen session {}",
                        self.limits.max_sessions, oldest
                    );
                }
                None => break,
            }
        }
        sessions.insert(id, session.clone());
        debug!("Created session {} ({} live)", id, sessions.len());
        session
    }

    /// Existing session for `id`, or a fresh one
    ///
    /// The flag is true when a new session was created.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Arc<Session>, bool) {
        if let Some(id) = id {
            if let Some(session) = self.get(id).await {
                return (session, false);
            }
        }
        (self.create().await, true)
    }

    /// Drop sessions not seen within the idle timeout as of `now`
    ///
    /// Returns the number of sessions dropped. Work already running for a
    /// dropped session finishes against its own handle.
    pub async fn evict_idle_at(&self, now: Instant) -> usize {
        let idle_timeout = self.limits.idle_timeout;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.saturating_duration_since(s.last_seen()) <= idle_timeout);
        let dropped = before - sessions.len();
        if dropped > 0 {
            info!(
                "Dropped {} idle sessions ({} live)",
                dropped,
                sessions.len()
            );
        }
        dropped
    }

    pub async fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now()).await
    }

    /// Run the idle sweep every `sweep_interval` until the runtime stops
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let registry = self.clone();
        let period = self.limits.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.evict_idle().await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
