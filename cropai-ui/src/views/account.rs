//! Account views: sign-in/sign-up forms and the dashboard

use super::{error_banner, escape, percent};
use crate::treatments::MAX_RATING;
use chrono::NaiveDate;
use cropai_common::models::{AnalysisRecord, AuthUser, TreatmentLog, TreatmentType};

/// Which account form to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

/// Sign-in or sign-up form, with the previous email and any message
pub fn auth_form(mode: AuthMode, email: &str, error: Option<&str>, notice: Option<&str>) -> String {
    let (heading, subtitle, action, submit, switch) = match mode {
        AuthMode::SignIn => (
            "Welcome Back",
            "Sign in to access your dashboard",
            "/auth/signin",
            "Sign In",
            r#"Don't have an account? <a href="/auth/signup">Sign Up</a>"#,
        ),
        AuthMode::SignUp => (
            "Create Account",
            "Join our farming community",
            "/auth/signup",
            "Sign Up",
            r#"Already have an account? <a href="/auth/signin">Sign In</a>"#,
        ),
    };

    let name_field = match mode {
        AuthMode::SignUp => {
            r#"<label>Full Name</label><input type="text" name="full_name" placeholder="Enter your full name">"#
        }
        AuthMode::SignIn => "",
    };

    let notice = notice
        .map(|n| format!(r#"<div class="notice">{}</div>"#, escape(n)))
        .unwrap_or_default();

    format!(
        r#"<section class="card auth-modal">
    <h2>{heading}</h2>
    <p class="muted">{subtitle}</p>
    {error}{notice}
    <form method="post" action="{action}" class="auth-form">
        {name_field}
        <label>Email</label><input type="email" name="email" value="{email}" placeholder="Enter your email">
        <label>Password</label><input type="password" name="password" placeholder="Enter your password">
        <button class="button" type="submit">{submit}</button>
    </form>
    <p class="muted">{switch}</p>
    <a class="button secondary" href="/">Close</a>
</section>"#,
        heading = heading,
        subtitle = subtitle,
        error = error_banner(error),
        notice = notice,
        action = action,
        name_field = name_field,
        email = escape(email),
        submit = submit,
        switch = switch,
    )
}

/// Dashboard tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTab {
    History,
    Treatments,
}

impl DashboardTab {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("treatments") => DashboardTab::Treatments,
            _ => DashboardTab::History,
        }
    }
}

/// Dashboard for a signed-in user
pub fn dashboard(
    user: &AuthUser,
    tab: DashboardTab,
    history: &[AnalysisRecord],
    treatments: &[TreatmentLog],
    today: NaiveDate,
    error: Option<&str>,
) -> String {
    let (history_class, treatments_class) = match tab {
        DashboardTab::History => ("tab active", "tab"),
        DashboardTab::Treatments => ("tab", "tab active"),
    };

    let content = match tab {
        DashboardTab::History => history_tab(history),
        DashboardTab::Treatments => treatments_tab(history, treatments, today),
    };

    format!(
        r#"<section class="dashboard-container">
    <h2>My Dashboard</h2>
    <p class="muted">Welcome, {name}. Track your analyses, treatments, and progress</p>
    {error}
    <div class="tabs">
        <a class="{history_class}" href="/dashboard?tab=history">📊 Analysis History</a>
        <a class="{treatments_class}" href="/dashboard?tab=treatments">💊 Treatments</a>
    </div>
    {content}
</section>"#,
        name = escape(user.display_name()),
        error = error_banner(error),
        history_class = history_class,
        treatments_class = treatments_class,
        content = content,
    )
}

/// Shown when the dashboard is requested without an account
pub fn sign_in_required() -> String {
    r#"<section class="card">
    <h2>Sign In Required</h2>
    <p>Please sign in to access your dashboard</p>
    <a class="button" href="/auth/signin">Sign In</a>
</section>"#
        .to_string()
}

fn history_tab(history: &[AnalysisRecord]) -> String {
    if history.is_empty() {
        return r#"<div class="card"><p class="muted">No analyses yet. Upload an image to get started.</p></div>"#
            .to_string();
    }
    let rows: String = history
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&r.disease_detected),
                percent(r.confidence),
                r.analyzed_at.format("%Y-%m-%d %H:%M")
            )
        })
        .collect();
    format!(
        r#"<div class="card"><table><tr><th>Disease</th><th>Confidence</th><th>Analyzed</th></tr>{}</table></div>"#,
        rows
    )
}

fn stars(rating: Option<u8>) -> String {
    match rating {
        None => r#"<span class="muted">Not rated</span>"#.to_string(),
        Some(r) => (1..=MAX_RATING)
            .map(|i| if i <= r { '★' } else { '☆' })
            .collect(),
    }
}

fn treatments_tab(history: &[AnalysisRecord], treatments: &[TreatmentLog], today: NaiveDate) -> String {
    let type_options: String = TreatmentType::ALL
        .iter()
        .map(|t| {
            let label = t.as_str();
            let mut chars = label.chars();
            let capitalized = match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            };
            format!(r#"<option value="{}">{}</option>"#, label, capitalized)
        })
        .collect();

    let analysis_options: String = history
        .iter()
        .map(|r| {
            format!(
                r#"<option value="{}">{} ({})</option>"#,
                escape(&r.id),
                escape(&r.disease_detected),
                r.analyzed_at.format("%Y-%m-%d")
            )
        })
        .collect();

    let rating_options: String = (0..=MAX_RATING)
        .map(|r| {
            let label = if r == 0 {
                "Not rated".to_string()
            } else {
                r.to_string()
            };
            format!(r#"<option value="{}">{}</option>"#, r, label)
        })
        .collect();

    let list = if treatments.is_empty() {
        r#"<p class="muted">No treatments logged yet.</p>"#.to_string()
    } else {
        treatments
            .iter()
            .map(|t| {
                let products = if t.products_used.is_empty() {
                    "None listed".to_string()
                } else {
                    escape(&t.products_used.join(", "))
                };
                let notes = if t.notes.is_empty() {
                    String::new()
                } else {
                    format!(r#"<p class="muted">{}</p>"#, escape(&t.notes))
                };
                format!(
                    r#"<div class="card treatment-item">
    <h4><span class="part-tag">{kind}</span> {date}</h4>
    <p>📦 {products}</p>
    <p>💲 {cost:.2} · {size:.2} acres · {stars}</p>
    {notes}
</div>"#,
                    kind = t.treatment_type,
                    date = t.application_date.format("%Y-%m-%d"),
                    products = products,
                    cost = t.cost,
                    size = t.field_size_treated,
                    stars = stars(t.effectiveness_rating),
                    notes = notes,
                )
            })
            .collect()
    };

    format!(
        r#"<div class="card treatment-tracker-container">
    <h3>Treatment Tracker</h3>
    <p class="muted">Monitor and log your treatment applications</p>
    <form method="post" action="/treatments" class="treatment-form">
        <label>Treatment Type</label><select name="treatment_type">{type_options}</select>
        <label>Related Analysis</label><select name="analysis_id"><option value="">None</option>{analysis_options}</select>
        <label>Products Used (comma-separated)</label><input type="text" name="products_used" placeholder="e.g., Neem oil, Copper fungicide">
        <label>Application Date</label><input type="date" name="application_date" value="{today}">
        <label>Cost ($)</label><input type="number" name="cost" step="0.01" min="0" value="0">
        <label>Field Size (acres)</label><input type="number" name="field_size_treated" step="0.01" min="0" value="0">
        <label>Effectiveness Rating</label><select name="effectiveness_rating">{rating_options}</select>
        <label>Notes</label><textarea name="notes" rows="3"></textarea>
        <button class="button" type="submit">Save Treatment</button>
    </form>
</div>
{list}"#,
        type_options = type_options,
        analysis_options = analysis_options,
        today = today.format("%Y-%m-%d"),
        rating_options = rating_options,
        list = list,
    )
}
