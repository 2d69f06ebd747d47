//! Element-addressed output surface.
//!
//! Renderers never build a whole page; they rewrite individual elements by
//! id, exactly as a browser dashboard rewrites `innerHTML`. [`Document`] is
//! that contract, and [`HtmlDocument`] is an in-memory implementation whose
//! contents can be exported as a standalone page.

use std::collections::BTreeMap;

use tracing::warn;

/// Element ids the dashboard renders into.
pub mod ids {
    pub const TEMP_CONTENT: &str = "temp-content";
    pub const HUMIDITY_CONTENT: &str = "humidity-content";
    pub const MEASUREMENTS_CONTENT: &str = "measurements-content";
    pub const VIOLATIONS_CONTENT: &str = "violations-content";

    pub const AI_CONTENT: &str = "ai-content";
    pub const AI_SKELETON: &str = "ai-skeleton";
    pub const AI_STATUS_BADGE: &str = "ai-status-badge";
    pub const AI_INSIGHTS_CONTENT: &str = "ai-insights-content";
    pub const AI_ANOMALIES_CONTENT: &str = "ai-anomalies-content";
    pub const AI_PREDICTIONS_CONTENT: &str = "ai-predictions-content";
    pub const AI_PATTERNS_CONTENT: &str = "ai-patterns-content";

    pub const VIOLATIONS_TABLE: &str = "violations-table";
    pub const VIOLATIONS_LIMIT: &str = "violations-limit";
    pub const FILTER_TEMP: &str = "filter-temp-violations";
    pub const FILTER_HUMIDITY: &str = "filter-humidity-violations";

    /// Trend charts, a `series-content` / `series-skeleton` pair.
    pub const SERIES: &str = "series";
    pub const SERIES_CONTENT: &str = "series-content";
    pub const SERIES_SKELETON: &str = "series-skeleton";

    pub const HEALTH_BADGE: &str = "health-badge";

    /// KPI cards, each a `<name>-content` / `<name>-skeleton` pair.
    pub const KPI_CARDS: [&str; 4] = ["temp", "humidity", "measurements", "violations"];

    pub fn content(name: &str) -> String {
        format!("{}-content", name)
    }

    pub fn skeleton(name: &str) -> String {
        format!("{}-skeleton", name)
    }
}

/// A set of addressable elements that renderers write into.
///
/// Every method returns `false` when the element does not exist. Callers
/// treat that as a logged, non-fatal condition.
pub trait Document {
    /// Replace the element's inner markup.
    fn set_html(&mut self, id: &str, markup: &str) -> bool;

    /// Show or hide the element.
    fn set_visible(&mut self, id: &str, visible: bool) -> bool;

    /// Set the checked state of a checkbox element.
    fn set_checked(&mut self, id: &str, checked: bool) -> bool;

    /// Set the current value of an input or select element.
    fn set_value(&mut self, id: &str, value: &str) -> bool;
}

/// Write markup, logging a missing target instead of failing.
pub fn write_html(doc: &mut dyn Document, id: &str, markup: &str) {
    if !doc.set_html(id, markup) {
        warn!("Render target #{} not found", id);
    }
}

/// Show or hide, logging a missing target instead of failing.
pub fn show(doc: &mut dyn Document, id: &str, visible: bool) {
    if !doc.set_visible(id, visible) {
        warn!("Render target #{} not found", id);
    }
}

/// Reveal `<name>-content` and hide `<name>-skeleton`.
pub fn reveal(doc: &mut dyn Document, name: &str) {
    show(doc, &ids::skeleton(name), false);
    show(doc, &ids::content(name), true);
}

/// Escape text for inclusion in markup.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// State of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub markup: String,
    pub visible: bool,
    pub checked: bool,
    pub value: Option<String>,
}

impl Element {
    fn new(visible: bool) -> Self {
        Self {
            markup: String::new(),
            visible,
            checked: false,
            value: None,
        }
    }
}

/// In-memory [`Document`].
#[derive(Debug, Clone, Default)]
pub struct HtmlDocument {
    elements: BTreeMap<String, Element>,
}

impl HtmlDocument {
    /// A document with no elements; every write misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard dashboard layout in its loading state: skeletons shown,
    /// content hidden.
    pub fn dashboard() -> Self {
        let mut doc = Self::empty();
        for name in ids::KPI_CARDS {
            doc.add(&ids::content(name), false);
            doc.add(&ids::skeleton(name), true);
        }
        doc.add(ids::SERIES_CONTENT, false);
        doc.add(ids::SERIES_SKELETON, true);
        doc.add(ids::AI_CONTENT, false);
        doc.add(ids::AI_SKELETON, true);
        for id in [
            ids::HEALTH_BADGE,
            ids::AI_STATUS_BADGE,
            ids::AI_INSIGHTS_CONTENT,
            ids::AI_ANOMALIES_CONTENT,
            ids::AI_PREDICTIONS_CONTENT,
            ids::AI_PATTERNS_CONTENT,
            ids::VIOLATIONS_TABLE,
            ids::VIOLATIONS_LIMIT,
            ids::FILTER_TEMP,
            ids::FILTER_HUMIDITY,
        ] {
            doc.add(id, true);
        }
        doc
    }

    /// Register an element.
    pub fn add(&mut self, id: &str, visible: bool) {
        self.elements.insert(id.to_string(), Element::new(visible));
    }

    pub fn remove(&mut self, id: &str) -> Option<Element> {
        self.elements.remove(id)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn html(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.markup.as_str())
    }

    pub fn is_visible(&self, id: &str) -> Option<bool> {
        self.elements.get(id).map(|e| e.visible)
    }

    pub fn is_checked(&self, id: &str) -> Option<bool> {
        self.elements.get(id).map(|e| e.checked)
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.elements.get(id).and_then(|e| e.value.as_deref())
    }
}

impl Document for HtmlDocument {
    fn set_html(&mut self, id: &str, markup: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(el) => {
                el.markup = markup.to_string();
                true
            }
            None => false,
        }
    }

    fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        match self.elements.get_mut(id) {
            Some(el) => {
                el.visible = visible;
                true
            }
            None => false,
        }
    }

    fn set_checked(&mut self, id: &str, checked: bool) -> bool {
        match self.elements.get_mut(id) {
            Some(el) => {
                el.checked = checked;
                true
            }
            None => false,
        }
    }

    fn set_value(&mut self, id: &str, value: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(el) => {
                el.value = Some(value.to_string());
                true
            }
            None => false,
        }
    }
}
