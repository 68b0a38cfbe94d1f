//! Server-Sent Events for session updates

use crate::session::Session;
use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
    Extension,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;

/// GET /api/events
///
/// Streams this session's events:
/// - ConnectionStatus (sent once on connect)
/// - AnalysisStarted / AnalysisCompleted / AnalysisFailed / AnalysisDiscarded
/// - SessionReset, HistoryRefreshed, ScreenChanged, AuthChanged
///
/// Idle connections receive a heartbeat comment.
pub async fn event_stream(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    cropai_common::sse::session_event_stream(&state.event_bus, session.id())
}
