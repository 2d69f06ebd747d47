//! Standalone page export.
//!
//! Lays the rendered elements of an [`HtmlDocument`] out into a complete
//! HTML file. Hidden elements keep their markup but are emitted with the
//! `hidden` attribute, so the page reflects exactly what a viewer would see.

use std::path::Path;

use anyhow::{Context, Result};

use super::document::{escape, ids, HtmlDocument};

const STYLE: &str = "\
body{font-family:sans-serif;margin:2rem;background:#f8f9fa;color:#212529}\
.cards{display:flex;gap:1rem;flex-wrap:wrap}\
.card{background:#fff;border-radius:.5rem;padding:1rem;min-width:12rem;box-shadow:0 1px 3px #0002}\
.kpi-value{font-size:1.6rem;font-weight:bold}\
.badge{padding:.2rem .5rem;border-radius:.3rem;color:#fff}\
.bg-danger{background:#dc3545}.bg-success{background:#198754}\
.bg-warning{background:#ffc107;color:#000}.bg-secondary{background:#6c757d}\
.text-danger{color:#dc3545}.text-muted{color:#6c757d}.text-center{text-align:center}\
table{width:100%;border-collapse:collapse;background:#fff}\
td,th{padding:.4rem;border-bottom:1px solid #dee2e6}\
.series-dimension{background:#fff;border-radius:.5rem;padding:1rem;margin-bottom:1rem}\
.series-chart{width:100%;height:10rem}\
.series-line{fill:none;stroke-width:2}\
.series-temperature .series-line{stroke:#fd7e14}.series-humidity .series-line{stroke:#0d6efd}\
.series-limit{stroke:#dc3545;stroke-dasharray:6 4}";

/// Render one element as a `<div>` (or a custom tag).
fn element(doc: &HtmlDocument, id: &str, tag: &str, class: &str) -> String {
    let Some(el) = doc.element(id) else {
        return String::new();
    };
    format!(
        r#"<{tag} id="{id}" class="{class}"{hidden}>{markup}</{tag}>"#,
        tag = tag,
        id = id,
        class = class,
        hidden = if el.visible { "" } else { " hidden" },
        markup = el.markup,
    )
}

fn checkbox(doc: &HtmlDocument, id: &str, label: &str) -> String {
    let checked = doc.is_checked(id).unwrap_or(false);
    format!(
        r#"<label><input type="checkbox" id="{}" disabled{}> {}</label>"#,
        id,
        if checked { " checked" } else { "" },
        label
    )
}

/// Build the full page.
pub fn to_page(doc: &HtmlDocument, title: &str, generated_at: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape(title)));
    out.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));
    out.push_str(&format!(
        "<h1>{} {}</h1>\n<p class=\"text-muted\">Gerado em {}</p>\n",
        escape(title),
        element(doc, ids::HEALTH_BADGE, "span", ""),
        escape(generated_at)
    ));

    out.push_str("<section class=\"cards\">\n");
    for name in ids::KPI_CARDS {
        out.push_str(&format!(
            "<div class=\"card\">{}</div>\n",
            element(doc, &ids::content(name), "div", "kpi")
        ));
    }
    out.push_str("</section>\n");

    out.push_str("<section>\n<h2>Série temporal</h2>\n");
    out.push_str(&element(doc, ids::SERIES_CONTENT, "div", "series"));
    out.push_str("\n</section>\n");

    out.push_str("<section>\n<h2>Análise inteligente ");
    out.push_str(&element(doc, ids::AI_STATUS_BADGE, "span", ""));
    out.push_str("</h2>\n");
    let mut ai = String::new();
    for (id, heading) in [
        (ids::AI_INSIGHTS_CONTENT, "Insights"),
        (ids::AI_ANOMALIES_CONTENT, "Anomalias"),
        (ids::AI_PREDICTIONS_CONTENT, "Predições"),
        (ids::AI_PATTERNS_CONTENT, "Padrões"),
    ] {
        ai.push_str(&format!(
            "<div class=\"card\"><h3>{}</h3>{}</div>\n",
            heading,
            element(doc, id, "div", "ai-panel")
        ));
    }
    if let Some(el) = doc.element(ids::AI_CONTENT) {
        out.push_str(&format!(
            "<div id=\"{}\" class=\"cards\"{}>\n{}</div>\n",
            ids::AI_CONTENT,
            if el.visible { "" } else { " hidden" },
            ai
        ));
    }
    out.push_str("</section>\n");

    out.push_str("<section>\n<h2>Violações</h2>\n<p>");
    out.push_str(&checkbox(doc, ids::FILTER_TEMP, "Temperatura"));
    out.push(' ');
    out.push_str(&checkbox(doc, ids::FILTER_HUMIDITY, "Umidade"));
    if let Some(limit) = doc.value(ids::VIOLATIONS_LIMIT) {
        out.push_str(&format!(" | Limite: {}", escape(limit)));
    }
    out.push_str("</p>\n<table>\n<thead><tr><th>Data/Hora</th><th>Temperatura</th>");
    out.push_str("<th>Umidade</th><th>Status</th><th>Motivo</th></tr></thead>\n");
    out.push_str(&element(doc, ids::VIOLATIONS_TABLE, "tbody", ""));
    out.push_str("\n</table>\n</section>\n</body>\n</html>\n");
    out
}

/// Write the page to `path`.
pub fn write_page(doc: &HtmlDocument, title: &str, generated_at: &str, path: &Path) -> Result<()> {
    std::fs::write(path, to_page(doc, title, generated_at))
        .with_context(|| format!("Failed to write {}", path.display()))
}
