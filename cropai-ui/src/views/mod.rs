//! HTML rendering
//!
//! Server-rendered pages, one module per screen. Views only read state;
//! every mutation goes through a POST route that redirects back to `/`.

pub mod account;
pub mod analyze;
pub mod guidance;
pub mod info;
pub mod library;

use crate::orchestrator::Screen;

/// Escape text for HTML element content and attribute values
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Percent-encode a query-string value
pub fn encode_query(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

/// Percent with one decimal, e.g. `92.5%`
pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Inline error banner; empty when there is nothing to show
pub fn error_banner(message: Option<&str>) -> String {
    match message {
        Some(msg) if !msg.is_empty() => format!(
            r#"<div class="error-state"><span class="error-icon">⚠️</span><p>{}</p></div>"#,
            escape(msg)
        ),
        _ => String::new(),
    }
}

/// What the nav bar needs to know
pub struct NavContext<'a> {
    pub active: Screen,
    /// Display name of the signed-in user
    pub user: Option<&'a str>,
}

fn nav_button(screen: Screen, label: &str, active: Screen) -> String {
    let class = if screen == active && screen != Screen::Analyze {
        "nav-link active"
    } else {
        "nav-link"
    };
    format!(
        r#"<form method="post" action="/navigate/{}"><button class="{}" type="submit">{}</button></form>"#,
        screen.as_str(),
        class,
        label
    )
}

fn nav_bar(nav: &NavContext<'_>) -> String {
    let mut links = String::new();
    links.push_str(&nav_button(Screen::Analyze, "Analyze", nav.active));
    links.push_str(&nav_button(Screen::LearnMore, "Learn More", nav.active));
    links.push_str(&nav_button(Screen::Library, "Disease Library", nav.active));

    match nav.user {
        Some(name) => {
            links.push_str(&nav_button(Screen::Dashboard, "Dashboard", nav.active));
            links.push_str(&format!(
                r#"<form method="post" action="/auth/signout"><button class="nav-link user-menu" type="submit">{} · Sign Out</button></form>"#,
                escape(name)
            ));
        }
        None => {
            links.push_str(r#"<a class="nav-link" href="/auth/signin">Sign In</a>"#);
        }
    }

    format!(
        r#"<nav class="navbar"><div class="nav-brand">🌱 CropAI</div><div class="nav-links">{}</div></nav>"#,
        links
    )
}

/// Full page with header, nav, footer and the live-update script
///
/// Pages marked `live` reload when the session's analysis settles.
pub fn page(title: &str, nav: &NavContext<'_>, body: &str, live: bool) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - CropAI</title>
    <style>{css}</style>
</head>
<body data-live="{live}">
    {nav}
    <div class="container">
        <header class="header">
            <div class="badge">🌱 AI-Powered Detection</div>
            <h1 class="title">Smart Crop Disease <span class="accent">Detection</span></h1>
            <p class="subtitle">Upload a crop leaf image and let our AI identify potential diseases with confidence scores</p>
        </header>
        <main class="main-content">
{body}
        </main>
        <footer class="footer">
            <p>Proof of concept for educational purposes. For production use, please validate results with agricultural experts.</p>
        </footer>
    </div>
    <script>{script}</script>
</body>
</html>"#,
        title = escape(title),
        css = STYLE,
        live = live,
        nav = nav_bar(nav),
        body = body,
        script = LIVE_SCRIPT,
    )
}

const LIVE_SCRIPT: &str = r#"
(function () {
    if (!window.EventSource) return;
    const source = new EventSource('/api/events');
    const reloadOn = ['AnalysisCompleted', 'AnalysisFailed', 'HistoryRefreshed'];
    reloadOn.forEach(function (name) {
        source.addEventListener(name, function () {
            if (document.body.dataset.live === 'true') {
                source.close();
                window.location.reload();
            }
        });
    });
})();
"#;

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background-color: #1a1a1a; color: #e0e0e0; line-height: 1.6; }
.navbar { display: flex; justify-content: space-between; align-items: center; padding: 12px 20px; background-color: #2a2a2a; border-bottom: 1px solid #3a3a3a; }
.nav-brand { font-weight: 700; color: #10b981; font-size: 20px; }
.nav-links { display: flex; gap: 8px; align-items: center; }
.nav-links form { display: inline; }
.nav-link { background: none; border: 1px solid transparent; color: #e0e0e0; padding: 6px 12px; border-radius: 4px; cursor: pointer; font-size: 14px; text-decoration: none; }
.nav-link:hover, .nav-link.active { border-color: #10b981; color: #10b981; }
.container { max-width: 1100px; margin: 0 auto; padding: 20px; }
.header { text-align: center; margin: 20px 0 30px; }
.badge { display: inline-block; padding: 4px 12px; border-radius: 12px; background: #10b98120; color: #10b981; font-size: 13px; }
.title { font-size: 34px; margin: 10px 0; }
.accent { color: #10b981; }
.subtitle { color: #888; }
h2 { color: #10b981; margin-bottom: 12px; }
h3 { margin-bottom: 8px; }
.card { background: #2a2a2a; border: 1px solid #3a3a3a; border-radius: 8px; padding: 20px; margin-bottom: 20px; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 16px; }
.button { display: inline-block; padding: 10px 20px; background: #10b981; color: white; border: none; text-decoration: none; border-radius: 4px; margin: 10px 5px 0 0; font-weight: 600; cursor: pointer; }
.button.secondary { background: #3a3a3a; }
.error-state { background: #ef444420; border: 1px solid #ef4444; color: #fca5a5; padding: 12px; border-radius: 6px; margin: 12px 0; }
.notice { background: #10b98120; border: 1px solid #10b981; padding: 12px; border-radius: 6px; margin: 12px 0; }
.warning-notice { background: #f59e0b20; border: 1px solid #f59e0b; padding: 12px; border-radius: 6px; margin-top: 12px; }
.preview-image { max-width: 100%; border-radius: 8px; }
.confidence-bar-container { background: #3a3a3a; border-radius: 4px; overflow: hidden; margin: 6px 0; }
.confidence-bar { background: #10b981; padding: 2px 8px; white-space: nowrap; font-size: 13px; }
.priority-badge, .severity-badge, .part-tag { display: inline-block; padding: 2px 8px; border-radius: 10px; font-size: 12px; background: #3a3a3a; margin-right: 4px; }
.priority-high, .severity-critical { background: #ef4444; color: #fff; }
.priority-medium, .severity-high { background: #f59e0b; color: #fff; }
.priority-low, .severity-moderate { background: #10b981; color: #fff; }
.tabs { display: flex; flex-wrap: wrap; gap: 6px; margin-bottom: 16px; }
.tab { padding: 6px 12px; border-radius: 4px; background: #3a3a3a; color: #e0e0e0; text-decoration: none; font-size: 14px; }
.tab.active { background: #10b981; color: #fff; }
input, select, textarea { background: #1a1a1a; color: #e0e0e0; border: 1px solid #3a3a3a; border-radius: 4px; padding: 8px; width: 100%; margin: 4px 0 12px; }
label { font-size: 14px; color: #aaa; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid #3a3a3a; }
.stat-value { font-size: 28px; font-weight: 700; color: #10b981; }
.stat-label { color: #888; font-size: 13px; }
.muted { color: #888; }
.spinner { width: 32px; height: 32px; border: 3px solid #3a3a3a; border-top-color: #10b981; border-radius: 50%; animation: spin 1s linear infinite; margin: 12px auto; }
@keyframes spin { to { transform: rotate(360deg); } }
.footer { text-align: center; color: #666; font-size: 13px; margin-top: 40px; }
"#;
