//! Disease library pages

use super::render_page;
use crate::error::{ApiError, ApiResult};
use crate::library::{crop_facets, filter_diseases, LibraryQuery};
use crate::orchestrator::Screen;
use crate::session::Session;
use crate::views::library::{library_detail, library_grid};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct LibraryParams {
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

impl LibraryParams {
    fn query(&self) -> LibraryQuery {
        LibraryQuery::new(self.crop.as_deref(), self.q.as_deref())
    }
}

pub(crate) async fn render_library(
    state: &AppState,
    session: &Session,
    query: &LibraryQuery,
) -> Html<String> {
    let entries = session.library().get_or_load(state.store.as_ref()).await;
    let facets = crop_facets(&entries);
    let shown = filter_diseases(&entries, query);
    render_page(session, "Disease Library", &library_grid(&facets, &shown, query), false).await
}

/// GET /library
pub async fn library_page(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Query(params): Query<LibraryParams>,
) -> Html<String> {
    session.orchestrator().show(Screen::Library).await;
    render_library(&state, &session, &params.query()).await
}

/// GET /library/:id
///
/// Served from the session cache; the back link restores the grid filter.
pub async fn disease_detail(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<String>,
    Query(params): Query<LibraryParams>,
) -> ApiResult<Html<String>> {
    let disease = session
        .library()
        .find(state.store.as_ref(), &id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Disease not found: {}", id)))?;

    session.orchestrator().show(Screen::Library).await;
    let body = library_detail(&disease, &params.query());
    Ok(render_page(&session, &disease.name, &body, false).await)
}

pub fn library_routes() -> Router<AppState> {
    Router::new()
        .route("/library", get(library_page))
        .route("/library/:id", get(disease_detail))
}
