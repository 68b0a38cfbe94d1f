//! Treatment guidance panel

use super::{encode_query, escape};
use crate::guidance::{category_icon, category_notice, Guidance, GuidanceSource, Severity};

const PRO_TIP: &str = "Combining organic and chemical methods often yields the best results. Start with organic solutions and use chemicals only when necessary.";

/// Link to a category tab, keeping the current page
fn tab_href(base: &str, category: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    escape(&format!("{}{}category={}", base, sep, encode_query(category)))
}

/// Tabbed guidance panel
///
/// `base_href` is the page the tab links point back to; `active` selects the
/// category shown, defaulting to the first one.
pub fn guidance_panel(
    guidance: &Guidance,
    severity: Severity,
    active: Option<&str>,
    base_href: &str,
) -> String {
    let active = active
        .filter(|c| guidance.category(c).is_some())
        .or_else(|| guidance.initial_category());

    let mut tabs = String::new();
    for solution in &guidance.solutions {
        let class = if Some(solution.category.as_str()) == active {
            "tab active"
        } else {
            "tab"
        };
        tabs.push_str(&format!(
            r#"<a class="{}" href="{}">{} {}</a>"#,
            class,
            tab_href(base_href, &solution.category),
            category_icon(&solution.category),
            escape(&solution.title)
        ));
    }

    let content = match active.and_then(|c| guidance.category(c)) {
        Some(solution) => {
            let items: String = solution
                .items
                .iter()
                .map(|item| format!("<li>{}</li>", escape(item)))
                .collect();
            let notice = category_notice(&solution.category)
                .map(|n| format!(r#"<div class="warning-notice">{}</div>"#, n))
                .unwrap_or_default();
            format!(
                r#"<div class="solution-card">
    <h3>{icon} {title} <span class="priority-badge priority-{priority}">{priority} priority</span></h3>
    <p class="muted">{description}</p>
    <ol>{items}</ol>
    {notice}
</div>"#,
                icon = category_icon(&solution.category),
                title = escape(&solution.title),
                priority = solution.priority.as_str(),
                description = escape(&solution.description),
                items = items,
                notice = notice,
            )
        }
        None => r#"<p class="muted">No guidance available.</p>"#.to_string(),
    };

    let source_note = match guidance.source {
        GuidanceSource::Store => "",
        GuidanceSource::Fallback => {
            r#"<p class="muted">Showing general guidance; no disease-specific plan is on file.</p>"#
        }
    };

    format!(
        r#"<section class="card solutions-container" id="solutions">
    <h3>⚠️ Action Plan Required</h3>
    <p><span class="severity-badge severity-{sev}">{sev_upper} severity detected</span></p>
    <p>Treatment plan for: <strong>{disease}</strong></p>
    {source_note}
    <div class="tabs">{tabs}</div>
    {content}
    <div class="notice">💡 <strong>Pro Tip:</strong> {tip}</div>
</section>"#,
        sev = severity.as_str(),
        sev_upper = severity.as_str().to_uppercase(),
        disease = escape(&guidance.disease),
        source_note = source_note,
        tabs = tabs,
        content = content,
        tip = PRO_TIP,
    )
}
