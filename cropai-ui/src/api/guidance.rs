//! Guidance fragment

use crate::error::{ApiError, ApiResult};
use crate::guidance::{load_guidance, Severity};
use crate::session::Session;
use crate::views::{encode_query, guidance::guidance_panel};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct GuidanceParams {
    #[serde(default)]
    pub disease: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Confidence used for the severity band
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// GET /guidance?disease=
///
/// HTML fragment with the tabbed guidance panel. Severity comes from the
/// `confidence` parameter, else from the session's top prediction for the
/// same disease, else `low`.
pub async fn guidance_fragment(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Query(params): Query<GuidanceParams>,
) -> ApiResult<Html<String>> {
    let disease = params
        .disease
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest("disease parameter is required".to_string()))?;

    let confidence = match params.confidence {
        Some(c) => Some(c),
        None => session
            .orchestrator()
            .snapshot()
            .await
            .top_prediction()
            .filter(|p| p.disease == disease)
            .map(|p| p.confidence),
    };
    let severity = confidence
        .map(Severity::from_confidence)
        .unwrap_or(Severity::Low);

    let guidance = load_guidance(state.store.as_ref(), disease).await;
    let base = format!("/guidance?disease={}", encode_query(disease));
    Ok(Html(guidance_panel(
        &guidance,
        severity,
        params.category.as_deref(),
        &base,
    )))
}

pub fn guidance_routes() -> Router<AppState> {
    Router::new().route("/guidance", get(guidance_fragment))
}
