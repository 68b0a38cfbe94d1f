//! HTTP handlers for cropai-ui
//!
//! Browser-facing routes render HTML; mutations are form POSTs answered with
//! a `303 See Other` back to a page. `/api/*` routes serve JSON and SSE.

pub mod account;
pub mod analysis;
pub mod guidance;
pub mod health;
pub mod library;
pub mod pages;
pub mod session;
pub mod sse;

pub use account::account_routes;
pub use analysis::analysis_routes;
pub use guidance::guidance_routes;
pub use health::health_routes;
pub use library::library_routes;
pub use pages::page_routes;
pub use session::session_middleware;
pub use sse::event_stream;

use crate::session::Session;
use crate::views::{self, NavContext};
use axum::response::Html;

/// Wrap a screen body in the page shell for this session
pub(crate) async fn render_page(session: &Session, title: &str, body: &str, live: bool) -> Html<String> {
    let active = session.orchestrator().snapshot().await.active_screen;
    let auth = session.auth().await;
    let nav = NavContext {
        active,
        user: auth.as_ref().map(|a| a.user.display_name()),
    };
    Html(views::page(title, &nav, body, live))
}
