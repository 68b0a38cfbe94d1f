//! Root page, screen switching and the JSON state snapshot

use super::render_page;
use crate::api::account::render_dashboard;
use crate::api::library::render_library;
use crate::error::{ApiError, ApiResult};
use crate::guidance::load_guidance;
use crate::library::LibraryQuery;
use crate::orchestrator::{AnalysisPhase, Screen, SessionViewState};
use crate::session::Session;
use crate::views::analyze::{analyze_screen, ResultsExtras};
use crate::views::info::info_screen;
use crate::views::account::DashboardTab;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    /// Any value opens the treatment guidance panel
    #[serde(default)]
    pub solutions: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// GET /
///
/// Renders whichever screen the session has active.
pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Query(params): Query<IndexParams>,
) -> Response {
    let view = session.orchestrator().snapshot().await;
    match view.active_screen {
        Screen::Analyze => analyze_page(&state, &session, &view, &params).await.into_response(),
        Screen::LearnMore => render_page(&session, "Learn More", &info_screen(), false)
            .await
            .into_response(),
        Screen::Library => render_library(&state, &session, &LibraryQuery::default())
            .await
            .into_response(),
        Screen::Dashboard => render_dashboard(&state, &session, DashboardTab::History, None)
            .await
            .into_response(),
    }
}

async fn analyze_page(
    state: &AppState,
    session: &Session,
    view: &SessionViewState,
    params: &IndexParams,
) -> axum::response::Html<String> {
    let mut details = None;
    let mut guidance = None;

    if view.phase() == AnalysisPhase::Completed {
        if let Some(top) = view.top_prediction() {
            details = match state.store.disease_by_name(&top.disease).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("Failed to load details for {}: {}", top.disease, e);
                    None
                }
            };
            if params.solutions.is_some() {
                guidance = Some(load_guidance(state.store.as_ref(), &top.disease).await);
            }
        }
    }

    let extras = ResultsExtras {
        details: details.as_ref(),
        guidance: guidance.as_ref(),
        category: params.category.as_deref(),
    };
    let body = analyze_screen(view, &extras);
    render_page(session, "Analyze", &body, view.is_analyzing).await
}

/// POST /navigate/:screen
pub async fn navigate(
    Extension(session): Extension<Arc<Session>>,
    Path(screen): Path<String>,
) -> ApiResult<Redirect> {
    let target = Screen::parse(&screen)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown screen: {}", screen)))?;
    let signed_in = session.is_signed_in().await;
    let now = session.orchestrator().navigate(target, signed_in).await;
    debug!("Session {} navigated to {:?} (requested {:?})", session.id(), now, target);
    Ok(Redirect::to("/"))
}

/// JSON view of a session
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub session_id: Uuid,
    pub phase: AnalysisPhase,
    pub signed_in: bool,
    #[serde(flatten)]
    pub view: SessionViewState,
}

/// GET /api/state
pub async fn session_state(Extension(session): Extension<Arc<Session>>) -> Json<StateResponse> {
    let view = session.orchestrator().snapshot().await;
    Json(StateResponse {
        session_id: session.id(),
        phase: view.phase(),
        signed_in: session.is_signed_in().await,
        view,
    })
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/navigate/:screen", post(navigate))
        .route("/api/state", get(session_state))
}
