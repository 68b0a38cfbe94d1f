//! cropai-ui library interface
//!
//! Web front end for crop-leaf disease detection. Exposes the router and
//! application state so integration tests can drive the service in-process.

pub mod api;
pub mod auth;
pub mod error;
pub mod guidance;
pub mod library;
pub mod orchestrator;
pub mod services;
pub mod session;
pub mod stats;
pub mod treatments;
pub mod views;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use cropai_common::events::EventBus;
use services::{AuthService, PersistenceService, PredictionService};
use session::{SessionLimits, SessionRegistry};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Capacity of the session event bus
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live browser sessions
    pub sessions: SessionRegistry,
    /// Structured data store (history, library, guidance, treatments)
    pub store: Arc<dyn PersistenceService>,
    /// Hosted authentication provider
    pub auth: Arc<dyn AuthService>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        predictor: Arc<dyn PredictionService>,
        store: Arc<dyn PersistenceService>,
        auth: Arc<dyn AuthService>,
        event_bus: EventBus,
        session_limits: SessionLimits,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(
                predictor,
                store.clone(),
                event_bus.clone(),
                session_limits,
            ),
            store,
            auth,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Everything except `/health` runs behind the session middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    let session_routes = Router::new()
        .merge(api::page_routes())
        .merge(api::analysis_routes())
        .merge(api::library_routes())
        .merge(api::guidance_routes())
        .merge(api::account_routes())
        .route("/api/events", get(api::event_stream))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_middleware,
        ));

    Router::new()
        .merge(session_routes)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
