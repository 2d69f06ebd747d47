//! KPI cards, the backend health badge and the analytics (AI) section.

use super::document::{escape, ids, reveal, show, write_html, Document};
use crate::data::format::{format_celsius, format_count, format_optional, format_percent};
use crate::data::{
    AnomalySummary, ApiHealth, Insight, Panel, PatternSummary, PredictionSummary, SummaryKpis,
};
use crate::source::{Facet, FacetSet};

/// Overall availability of the analytic facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiStatus {
    /// Every facet answered.
    Active,
    /// Some facets failed.
    Partial,
    /// Every facet failed.
    Unavailable,
    /// Analytics switched off in configuration.
    Disabled,
}

impl AiStatus {
    pub fn from_facets(facets: &FacetSet, enabled: bool) -> Self {
        if !enabled {
            return AiStatus::Disabled;
        }
        match facets.failed_ai().len() {
            0 => AiStatus::Active,
            n if n == Facet::AI.len() => AiStatus::Unavailable,
            _ => AiStatus::Partial,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AiStatus::Active => "Ativo",
            AiStatus::Partial => "Parcial",
            AiStatus::Unavailable => "Indisponível",
            AiStatus::Disabled => "Desativado",
        }
    }

    fn badge_class(&self) -> &'static str {
        match self {
            AiStatus::Active => "bg-success",
            AiStatus::Partial => "bg-warning",
            AiStatus::Unavailable => "bg-danger",
            AiStatus::Disabled => "bg-secondary",
        }
    }
}

fn error_block(what: &str, message: &str) -> String {
    format!(
        r#"<div class="ai-error text-danger">Erro ao carregar {}: {}</div>"#,
        what,
        escape(message)
    )
}

fn empty_block(message: &str) -> String {
    format!(r#"<div class="ai-empty text-muted">{}</div>"#, escape(message))
}

/// Render a panel through its three branches.
fn panel_markup<T>(panel: &Panel<T>, what: &str, ready: impl FnOnce(&T) -> String) -> String {
    match panel {
        Panel::Ready(value) => ready(value),
        Panel::Insufficient(message) => empty_block(message),
        Panel::Failed(message) => error_block(what, message),
    }
}

pub fn anomalies_markup(panel: &Panel<AnomalySummary>) -> String {
    panel_markup(panel, "anomalias", |a| {
        format!(
            concat!(
                r#"<div class="ai-metric"><strong>{}</strong> anomalias ({})</div>"#,
                r#"<div class="ai-detail">{} de alta severidade em {} medições</div>"#
            ),
            a.count,
            format_percent(a.rate),
            a.high_severity,
            format_count(a.total_measurements)
        )
    })
}

pub fn predictions_markup(panel: &Panel<PredictionSummary>) -> String {
    panel_markup(panel, "predições", |p| {
        let trend = |t: &Option<String>| match t.as_deref() {
            Some("increasing") => "↑",
            Some("decreasing") => "↓",
            _ => "→",
        };
        format!(
            concat!(
                r#"<div class="ai-metric">Temperatura prevista: <strong>{}</strong> {}</div>"#,
                r#"<div class="ai-metric">Umidade prevista: <strong>{}</strong> {}</div>"#,
                r#"<div class="ai-detail">Probabilidade de violação: {}</div>"#
            ),
            format_celsius(p.temperature),
            trend(&p.temperature_trend),
            format_percent(p.humidity),
            trend(&p.humidity_trend),
            format_percent(p.violation_probability)
        )
    })
}

pub fn patterns_markup(panel: &Panel<PatternSummary>) -> String {
    panel_markup(panel, "padrões", |p| {
        format!(
            concat!(
                r#"<div class="ai-metric">Taxa de violações: <strong>{}</strong></div>"#,
                r#"<div class="ai-detail">{} medições analisadas{}</div>"#
            ),
            format_percent(p.violation_rate),
            format_count(p.total_measurements),
            p.analysis_period
                .as_deref()
                .map(|period| format!(" ({})", escape(period)))
                .unwrap_or_default()
        )
    })
}

pub fn insights_markup(panel: &Panel<Vec<Insight>>) -> String {
    panel_markup(panel, "insights", |items| {
        if items.is_empty() {
            return empty_block("Nenhum insight relevante no período");
        }
        let mut out = String::from(r#"<ul class="ai-insights">"#);
        for insight in items {
            out.push_str(&format!(
                r#"<li class="insight insight-{}"><strong>{}</strong> {}"#,
                escape(&insight.kind),
                escape(&insight.title),
                escape(&insight.description)
            ));
            if let Some(rec) = &insight.recommendation {
                out.push_str(&format!(" <em>{}</em>", escape(rec)));
            }
            out.push_str("</li>");
        }
        out.push_str("</ul>");
        out
    })
}

/// Rewrite the analytics section and swap its skeleton for content.
pub fn render_ai(doc: &mut dyn Document, facets: &FacetSet, enabled: bool) {
    let status = AiStatus::from_facets(facets, enabled);
    write_html(
        doc,
        ids::AI_STATUS_BADGE,
        &format!(
            r#"<span class="badge {}">{}</span>"#,
            status.badge_class(),
            status.label()
        ),
    );

    show(doc, ids::AI_SKELETON, false);
    if !enabled {
        show(doc, ids::AI_CONTENT, false);
        return;
    }

    write_html(
        doc,
        ids::AI_INSIGHTS_CONTENT,
        &insights_markup(&Insight::from_facet(&facets.insights)),
    );
    write_html(
        doc,
        ids::AI_ANOMALIES_CONTENT,
        &anomalies_markup(&AnomalySummary::from_facet(&facets.anomalies)),
    );
    write_html(
        doc,
        ids::AI_PREDICTIONS_CONTENT,
        &predictions_markup(&PredictionSummary::from_facet(&facets.predictions)),
    );
    write_html(
        doc,
        ids::AI_PATTERNS_CONTENT,
        &patterns_markup(&PatternSummary::from_facet(&facets.patterns)),
    );
    show(doc, ids::AI_CONTENT, true);
}

/// Write the backend health badge.
pub fn render_health(doc: &mut dyn Document, health: ApiHealth) {
    let class = match health {
        ApiHealth::Healthy => "bg-success",
        ApiHealth::Warning => "bg-warning",
        ApiHealth::Unhealthy | ApiHealth::Unreachable => "bg-danger",
        ApiHealth::Unknown => "bg-secondary",
    };
    write_html(
        doc,
        ids::HEALTH_BADGE,
        &format!(r#"<span class="badge {}">{}</span>"#, class, health.label()),
    );
}

fn kpi_card(value: String, detail: String) -> String {
    format!(
        r#"<div class="kpi-value">{}</div><div class="kpi-detail">{}</div>"#,
        escape(&value),
        escape(&detail)
    )
}

fn range(min: Option<f64>, max: Option<f64>, format: fn(f64) -> String) -> String {
    format!(
        "mín {} / máx {}",
        format_optional(min, format),
        format_optional(max, format)
    )
}

/// Rewrite the four KPI cards from the summary facet.
pub fn render_kpis(doc: &mut dyn Document, summary: &Panel<SummaryKpis>) {
    let cards: [(&str, String); 4] = match summary {
        Panel::Ready(k) => [
            (
                "temp",
                kpi_card(
                    format_optional(k.temperature_mean, format_celsius),
                    range(k.temperature_min, k.temperature_max, format_celsius),
                ),
            ),
            (
                "humidity",
                kpi_card(
                    format_optional(k.humidity_mean, format_percent),
                    range(k.humidity_min, k.humidity_max, format_percent),
                ),
            ),
            (
                "measurements",
                kpi_card(format_count(k.total_measurements), "no período".to_string()),
            ),
            (
                "violations",
                kpi_card(
                    format_count(k.violations_count),
                    if k.total_measurements > 0 {
                        format!(
                            "{} das medições",
                            format_percent(
                                k.violations_count as f64 / k.total_measurements as f64 * 100.0
                            )
                        )
                    } else {
                        "sem medições".to_string()
                    },
                ),
            ),
        ],
        Panel::Insufficient(message) | Panel::Failed(message) => {
            let block = format!(
                r#"<div class="kpi-error text-danger">{}</div>"#,
                escape(message)
            );
            ids::KPI_CARDS.map(|name| (name, block.clone()))
        }
    };

    for (name, markup) in cards {
        write_html(doc, &ids::content(name), &markup);
        reveal(doc, name);
    }
}
