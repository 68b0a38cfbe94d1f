//! Analyze screen: upload form, results panel and history statistics

use super::{error_banner, escape, guidance::guidance_panel, percent};
use crate::guidance::{ConfidenceLevel, Guidance, Severity};
use crate::orchestrator::{AnalysisPhase, SessionViewState};
use crate::stats::HistoryStatistics;
use cropai_common::models::{DiseaseInfo, Prediction};

/// Extra data loaded for the results panel
#[derive(Default)]
pub struct ResultsExtras<'a> {
    /// Reference entry for the top prediction
    pub details: Option<&'a DiseaseInfo>,
    /// Guidance, when the user opened the treatment panel
    pub guidance: Option<&'a Guidance>,
    pub category: Option<&'a str>,
}

/// Whole Analyze screen for the current phase
pub fn analyze_screen(view: &SessionViewState, extras: &ResultsExtras<'_>) -> String {
    match view.phase() {
        AnalysisPhase::Idle => {
            let mut html = upload_form();
            if let Some(stats) = HistoryStatistics::compute(&view.history) {
                html.push_str(&statistics_panel(&stats));
            }
            html
        }
        _ => results_panel(view, extras),
    }
}

pub fn upload_form() -> String {
    r#"<section class="card upload-section">
    <h2>Upload Crop Leaf Image</h2>
    <form method="post" action="/analyze" enctype="multipart/form-data">
        <input type="file" name="image" accept="image/*" required>
        <p class="muted">Supports: JPG, PNG, JPEG</p>
        <button class="button" type="submit">Analyze Image</button>
    </form>
</section>
<div class="grid features-grid">
    <div class="card"><h3>🔬 AI Analysis</h3><p class="muted">Advanced deep learning model for accurate disease detection</p></div>
    <div class="card"><h3>⚡ Fast Results</h3><p class="muted">Get instant predictions with confidence scores</p></div>
    <div class="card"><h3>🌾 38+ Diseases</h3><p class="muted">Detects diseases across multiple crop types</p></div>
</div>"#
        .to_string()
}

pub fn statistics_panel(stats: &HistoryStatistics) -> String {
    let top: String = stats
        .top_diseases
        .iter()
        .enumerate()
        .map(|(i, d)| {
            format!(
                r#"<tr><td>#{}</td><td>{}</td><td>{} times</td></tr>"#,
                i + 1,
                escape(&d.disease),
                d.count
            )
        })
        .collect();

    let recent: String = stats
        .recent
        .iter()
        .map(|r| {
            format!(
                r#"<tr><td>{}</td><td class="muted">{}</td><td>{}</td></tr>"#,
                escape(&r.disease_detected),
                r.analyzed_at.format("%Y-%m-%d at %H:%M"),
                percent(r.confidence)
            )
        })
        .collect();

    format!(
        r#"<section class="statistics-section">
    <h2>Analysis Statistics</h2>
    <div class="grid">
        <div class="card"><div class="stat-value">{total}</div><div class="stat-label">📊 Total Analyses</div></div>
        <div class="card"><div class="stat-value">{avg}%</div><div class="stat-label">🎯 Avg Confidence</div></div>
        <div class="card"><div class="stat-value">{unique}</div><div class="stat-label">🌾 Unique Diseases</div></div>
    </div>
    <div class="grid">
        <div class="card"><h3>Most Detected Diseases</h3><table>{top}</table></div>
        <div class="card"><h3>Recent Analyses</h3><table>{recent}</table></div>
    </div>
</section>"#,
        total = stats.total,
        avg = stats.average_display(),
        unique = stats.unique_diseases,
        top = top,
        recent = recent,
    )
}

fn prediction_row(index: usize, prediction: &Prediction) -> String {
    let badge = if index == 0 {
        r#" <span class="priority-badge priority-low">Primary Detection</span>"#
    } else {
        ""
    };
    format!(
        r#"<div class="prediction-item">
    <h3>#{rank} {disease}{badge}</h3>
    <div class="confidence-bar-container"><div class="confidence-bar" style="width: {width:.1}%">{label}</div></div>
</div>"#,
        rank = index + 1,
        disease = escape(&prediction.disease),
        badge = badge,
        width = prediction.confidence.clamp(0.0, 100.0),
        label = percent(prediction.confidence),
    )
}

fn disease_block(top: &Prediction, details: Option<&DiseaseInfo>) -> String {
    let body = match details {
        Some(d) => {
            let parts: String = d
                .affected_parts
                .iter()
                .map(|p| format!(r#"<span class="part-tag">{}</span>"#, escape(p)))
                .collect();
            let conditions = if d.optimal_conditions.is_empty() {
                String::new()
            } else {
                format!(
                    "<h4>🌡️ Optimal Conditions for Disease</h4><p>{}</p>",
                    escape(&d.optimal_conditions)
                )
            };
            format!(
                r#"<p><strong>Crop Type:</strong> {crop} · <strong>Severity Level:</strong> <span class="severity-badge">{severity}</span></p>
<h4>🔍 Symptoms</h4><p>{symptoms}</p>
<h4>⚠️ Causes</h4><p>{causes}</p>
<h4>🛡️ Prevention</h4><p>{prevention}</p>
<h4>💊 Treatment</h4><p>{treatment}</p>
{parts_block}{conditions}"#,
                crop = escape(&d.crop_type),
                severity = escape(&d.severity),
                symptoms = escape(&d.symptoms),
                causes = escape(&d.causes),
                prevention = escape(&d.prevention),
                treatment = escape(&d.treatment),
                parts_block = if parts.is_empty() {
                    String::new()
                } else {
                    format!("<h4>🌿 Affected Parts</h4><p>{}</p>", parts)
                },
                conditions = conditions,
            )
        }
        None => format!(
            "<p>This disease has been detected in your crop with {} confidence. \
We recommend consulting with a local agricultural expert for detailed information and treatment options specific to your region. \
Document the affected areas with clear photos and monitor the spread closely. Early intervention is key to preventing further damage.</p>",
            percent(top.confidence)
        ),
    };

    format!(
        r#"<section class="card disease-info-block">
    <h3>🦠 About This Disease</h3>
    <p><strong>Disease Name:</strong> {} · <strong>Confidence:</strong> {}</p>
    {}
</section>"#,
        escape(&top.disease),
        percent(top.confidence),
        body
    )
}

const NEXT_STEPS: [&str; 5] = [
    "Document the affected areas with photos",
    "Isolate infected plants if possible",
    "Consult with local agricultural extension",
    "Consider appropriate treatment options based on recommendations",
    "Monitor surrounding plants for symptoms",
];

pub fn results_panel(view: &SessionViewState, extras: &ResultsExtras<'_>) -> String {
    let image = match view.selected_image {
        Some(handle) => format!(
            r#"<img class="preview-image" src="/image/{}" alt="Uploaded crop">"#,
            handle
        ),
        None => String::new(),
    };

    let body = match view.phase() {
        AnalysisPhase::Submitted => r#"<div class="loading-state">
    <div class="spinner"></div>
    <p>Analyzing image with AI model...</p>
    <p class="muted">Please wait while we process your image...</p>
</div>"#
            .to_string(),
        AnalysisPhase::Failed => error_banner(view.error.as_deref()),
        _ => match view.top_prediction() {
            None => r#"<div class="empty-state"><p>No predictions available</p></div>"#.to_string(),
            Some(top) => completed_body(view, top, extras),
        },
    };

    format!(
        r#"<section class="results-section">
    <div class="grid">
        <div class="card">
            {image}
            <form method="post" action="/reset"><button class="button secondary" type="submit">Analyze Another</button></form>
        </div>
        <div class="card predictions-container">
            <h2>Analysis Results</h2>
            {body}
        </div>
    </div>
</section>"#,
        image = image,
        body = body,
    )
}

fn completed_body(view: &SessionViewState, top: &Prediction, extras: &ResultsExtras<'_>) -> String {
    let level = ConfidenceLevel::from_confidence(top.confidence);
    let predictions: String = view
        .predictions
        .iter()
        .enumerate()
        .map(|(i, p)| prediction_row(i, p))
        .collect();

    let solutions = match extras.guidance {
        Some(guidance) => format!(
            r#"<a class="button secondary" href="/">Hide Treatment Solutions</a>{}"#,
            guidance_panel(
                guidance,
                Severity::from_confidence(top.confidence),
                extras.category,
                "/?solutions=1",
            )
        ),
        None => {
            let steps: String = NEXT_STEPS.iter().map(|s| format!("<li>{}</li>", s)).collect();
            format!(
                r#"<a class="button" href="/?solutions=1#solutions">💊 View Treatment Solutions</a>
<div class="card results-info"><h4>Next Steps</h4><ul>{}</ul></div>"#,
                steps
            )
        }
    };

    format!(
        r#"<div class="confidence-summary">
    <span class="priority-badge">🎯 {level} Confidence</span>
    <p>{recommendation}</p>
</div>
<div class="predictions-list">{predictions}</div>
{disease}
{solutions}"#,
        level = level.as_str(),
        recommendation = level.recommendation(),
        predictions = predictions,
        disease = disease_block(top, extras.details),
        solutions = solutions,
    )
}
