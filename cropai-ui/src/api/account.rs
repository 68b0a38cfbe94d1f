//! Account routes: sign-in, sign-up, sign-out, dashboard and treatments

use super::render_page;
use crate::auth::{self, AuthOutcome, SignInForm, SignUpForm, CONFIRM_EMAIL_MESSAGE};
use crate::error::{ApiError, ApiResult};
use crate::orchestrator::Screen;
use crate::session::Session;
use crate::treatments::{record_treatment, recent_treatments, TreatmentForm};
use crate::views::account::{auth_form, dashboard, sign_in_required, AuthMode, DashboardTab};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// GET /auth/signin
pub async fn sign_in_page(Extension(session): Extension<Arc<Session>>) -> Response {
    if session.is_signed_in().await {
        return Redirect::to("/").into_response();
    }
    let body = auth_form(AuthMode::SignIn, "", None, None);
    render_page(&session, "Sign In", &body, false).await.into_response()
}

/// POST /auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Form(form): Form<SignInForm>,
) -> Response {
    match auth::sign_in(&session, state.auth.as_ref(), &form).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            warn!("Sign-in failed for session {}: {}", session.id(), e);
            let body = auth_form(AuthMode::SignIn, &form.email, Some(&e.user_message()), None);
            render_page(&session, "Sign In", &body, false).await.into_response()
        }
    }
}

/// GET /auth/signup
pub async fn sign_up_page(Extension(session): Extension<Arc<Session>>) -> Response {
    if session.is_signed_in().await {
        return Redirect::to("/").into_response();
    }
    let body = auth_form(AuthMode::SignUp, "", None, None);
    render_page(&session, "Sign Up", &body, false).await.into_response()
}

/// POST /auth/signup
pub async fn sign_up(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Form(form): Form<SignUpForm>,
) -> Response {
    match auth::sign_up(&session, state.auth.as_ref(), &form).await {
        Ok(AuthOutcome::SignedIn) => Redirect::to("/").into_response(),
        Ok(AuthOutcome::ConfirmationRequired) => {
            let body = auth_form(AuthMode::SignIn, &form.email, None, Some(CONFIRM_EMAIL_MESSAGE));
            render_page(&session, "Sign In", &body, false).await.into_response()
        }
        Err(e) => {
            warn!("Sign-up failed for session {}: {}", session.id(), e);
            let body = auth_form(AuthMode::SignUp, &form.email, Some(&e.user_message()), None);
            render_page(&session, "Sign Up", &body, false).await.into_response()
        }
    }
}

/// POST /auth/signout
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
) -> Redirect {
    auth::sign_out(&session, state.auth.as_ref()).await;
    Redirect::to("/")
}

/// Analyses listed on the dashboard history tab
pub const DASHBOARD_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    #[serde(default)]
    pub tab: Option<String>,
}

/// Dashboard page; `401` with a sign-in prompt when signed out
pub(crate) async fn render_dashboard(
    state: &AppState,
    session: &Session,
    tab: DashboardTab,
    error: Option<&str>,
) -> Response {
    let Some(caller) = session.auth().await else {
        let page = render_page(session, "Dashboard", &sign_in_required(), false).await;
        return (StatusCode::UNAUTHORIZED, page).into_response();
    };

    let view = session.orchestrator().snapshot().await;
    // Shared analysis history; saved analyses carry no user id
    let history = &view.history[..view.history.len().min(DASHBOARD_HISTORY_LIMIT)];
    let treatments = match tab {
        DashboardTab::Treatments => recent_treatments(state.store.as_ref(), &caller, None).await,
        DashboardTab::History => Vec::new(),
    };

    let body = dashboard(
        &caller.user,
        tab,
        history,
        &treatments,
        Utc::now().date_naive(),
        error,
    );
    render_page(session, "Dashboard", &body, false).await.into_response()
}

/// GET /dashboard?tab=history|treatments
pub async fn dashboard_page(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Query(params): Query<DashboardParams>,
) -> Response {
    if session.is_signed_in().await {
        session.orchestrator().show(Screen::Dashboard).await;
    }
    render_dashboard(&state, &session, DashboardTab::parse(params.tab.as_deref()), None).await
}

/// POST /treatments
pub async fn create_treatment(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Form(form): Form<TreatmentForm>,
) -> ApiResult<Response> {
    let caller = session
        .auth()
        .await
        .ok_or_else(|| ApiError::Unauthorized("Sign in to log treatments".to_string()))?;

    match record_treatment(state.store.as_ref(), &caller, form).await {
        Ok(_) => Ok(Redirect::to("/dashboard?tab=treatments").into_response()),
        Err(e) => {
            warn!("Failed to save treatment for user {}: {}", caller.user.id, e);
            let message = e.user_message();
            Ok(render_dashboard(&state, &session, DashboardTab::Treatments, Some(&message)).await)
        }
    }
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", get(sign_in_page).post(sign_in))
        .route("/auth/signup", get(sign_up_page).post(sign_up))
        .route("/auth/signout", post(sign_out))
        .route("/dashboard", get(dashboard_page))
        .route("/treatments", post(create_treatment))
}
