//! Rendering of fetched data into element-addressed markup.
//!
//! ## Submodules
//!
//! - [`document`]: The [`Document`] output contract and the in-memory
//!   [`HtmlDocument`]
//! - [`violations`]: The violation table, its filter controls and row view
//!   model
//! - [`sections`]: KPI cards, the health badge and the analytics section
//! - [`series`]: Temperature/humidity trend charts
//! - [`page`]: Standalone HTML export

pub mod document;
pub mod page;
pub mod sections;
pub mod series;
pub mod violations;

pub use document::{escape, ids, Document, Element, HtmlDocument};
pub use page::{to_page, write_page};
pub use sections::{render_ai, render_health, render_kpis, AiStatus};
pub use series::{render_series, series_markup};
pub use violations::{render_controls, render_error, render_raw, render_table, ViolationRow};
