// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # envwatch
//!
//! A dashboard client for temperature/humidity monitoring APIs.
//!
//! This crate fetches period summaries, violation records and analytic
//! facets from a monitoring backend, classifies each record against fixed
//! thresholds (17.0-19.5 °C, relative humidity up to 62 %), and renders the
//! result both into an element-addressed HTML document and into an
//! interactive terminal UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                           Application                             │
//! │  ┌──────────┐   ┌─────────┐   ┌───────────┐   ┌────────────────┐  │
//! │  │ refresh  │──▶│ source  │──▶│ dashboard │──▶│ render (HTML)  │  │
//! │  │(schedule)│   │ (fetch) │   │(coordinate)   │ ui (terminal)  │  │
//! │  └──────────┘   └────┬────┘   └─────┬─────┘   └────────────────┘  │
//! │                      │              │                             │
//! │                      ▼              ▼                             │
//! │                 ApiClient      data + filter                      │
//! │              (HttpClient)   (classify, narrow)                    │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: Layered configuration store with dotted-path access,
//!   validation bounds and environment overrides
//! - **[`source`]**: The [`ApiClient`] trait, its HTTP implementation, and
//!   the [`DataFetcher`] that runs each cycle's requests concurrently
//! - **[`data`]**: Measurements, thresholds, facet panels and formatting
//! - **[`filter`]**: The two-toggle [`FilterEngine`] over the cached records
//! - **[`render`]**: Element-addressed output ([`Document`]) and page export
//! - **[`dashboard`]**: The [`Dashboard`] coordinator; drops stale cycles
//! - **[`refresh`]**: Background [`Scheduler`] for periodic and manual cycles
//! - **[`app`]**, **[`events`]**, **[`ui`]**: The terminal front end
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Interactive dashboard against a local backend
//! envwatch --api-url http://localhost:8000
//!
//! # One cycle, written out as a standalone page
//! envwatch --env production --days 7 --export dashboard.html
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use envwatch::{ConfigStore, Dashboard, Environment, HttpClient};
//!
//! # tokio_test::block_on(async {
//! let config = ConfigStore::new(Environment::Development);
//! let client = HttpClient::from_config(&config).unwrap();
//! let mut dashboard = Dashboard::from_config(config, Arc::new(client));
//!
//! dashboard.refresh().await;
//! dashboard.toggle_temperature();
//! for row in dashboard.rows() {
//!     println!("{} {} {}", row.timestamp, row.temperature, row.status.label());
//! }
//! # });
//! ```

pub mod app;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod events;
pub mod filter;
pub mod notify;
pub mod refresh;
pub mod render;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::{ConfigStore, Environment};
pub use dashboard::Dashboard;
pub use data::{Measurement, Panel, RecordStatus};
pub use filter::{FilterEngine, FilterToggles};
pub use notify::{Notifier, StatusLine};
pub use refresh::{RefreshEvent, Scheduler};
pub use render::{Document, HtmlDocument, ViolationRow};
pub use source::{ApiClient, CycleOutcome, DataFetcher, FetchError, HttpClient, Period};
