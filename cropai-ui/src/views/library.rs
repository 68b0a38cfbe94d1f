//! Disease library grid and detail view

use super::{encode_query, escape};
use crate::library::LibraryQuery;
use cropai_common::models::DiseaseInfo;

/// Query string that reproduces the current filter
pub fn filter_query(query: &LibraryQuery) -> String {
    format!(
        "crop={}&q={}",
        encode_query(query.crop.label()),
        encode_query(&query.text)
    )
}

fn header() -> &'static str {
    r#"<div class="library-header">
    <div>
        <h2>Disease Library</h2>
        <p class="muted">Browse comprehensive information about crop diseases</p>
    </div>
    <form method="post" action="/navigate/analyze"><button class="button secondary" type="submit">Close</button></form>
</div>"#
}

pub fn library_grid(facets: &[String], shown: &[&DiseaseInfo], query: &LibraryQuery) -> String {
    let facet_links: String = facets
        .iter()
        .map(|facet| {
            let class = if facet == query.crop.label() {
                "tab active"
            } else {
                "tab"
            };
            let href = format!(
                "/library?crop={}&q={}",
                encode_query(facet),
                encode_query(&query.text)
            );
            format!(
                r#"<a class="{}" href="{}">{}</a>"#,
                class,
                escape(&href),
                escape(facet)
            )
        })
        .collect();

    let back = filter_query(query);
    let cards: String = if shown.is_empty() {
        r#"<p class="muted">No diseases found matching your criteria</p>"#.to_string()
    } else {
        shown
            .iter()
            .map(|d| {
                let href = format!("/library/{}?{}", encode_query(&d.id), back);
                format!(
                    r#"<a class="card disease-card" href="{href}">
    <h3>{name}</h3>
    <p><span class="part-tag">{crop}</span> <span class="severity-badge">{severity}</span></p>
    <p class="muted">{symptoms}</p>
</a>"#,
                    href = escape(&href),
                    name = escape(&d.name),
                    crop = escape(&d.crop_type),
                    severity = escape(&d.severity),
                    symptoms = escape(&d.symptoms),
                )
            })
            .collect()
    };

    format!(
        r#"<section class="disease-library">
    {header}
    <form method="get" action="/library" class="library-controls">
        <input type="hidden" name="crop" value="{crop}">
        <input type="text" name="q" value="{text}" placeholder="Search diseases or symptoms...">
    </form>
    <div class="tabs">{facets}</div>
    <div class="grid">{cards}</div>
</section>"#,
        header = header(),
        crop = escape(query.crop.label()),
        text = escape(&query.text),
        facets = facet_links,
        cards = cards,
    )
}

pub fn library_detail(disease: &DiseaseInfo, query: &LibraryQuery) -> String {
    let parts: String = disease
        .affected_parts
        .iter()
        .map(|p| format!(r#"<span class="part-tag">{}</span>"#, escape(p)))
        .collect();
    let back = escape(&format!("/library?{}", filter_query(query)));

    format!(
        r#"<section class="disease-library">
    {header}
    <div class="card disease-detail">
        <a class="button secondary" href="{back}">← Back to library</a>
        <h2>{name}</h2>
        <p><span class="part-tag">{crop}</span> <span class="severity-badge">{severity}</span></p>
        <h4>🔍 Symptoms</h4><p>{symptoms}</p>
        <h4>⚠️ Causes</h4><p>{causes}</p>
        <h4>🛡️ Prevention</h4><p>{prevention}</p>
        <h4>💊 Treatment</h4><p>{treatment}</p>
        <h4>🌿 Affected Parts</h4><p>{parts}</p>
        <h4>🌡️ Optimal Conditions</h4><p>{conditions}</p>
    </div>
</section>"#,
        header = header(),
        back = back,
        name = escape(&disease.name),
        crop = escape(&disease.crop_type),
        severity = escape(&disease.severity),
        symptoms = escape(&disease.symptoms),
        causes = escape(&disease.causes),
        prevention = escape(&disease.prevention),
        treatment = escape(&disease.treatment),
        parts = parts,
        conditions = escape(&disease.optimal_conditions),
    )
}
