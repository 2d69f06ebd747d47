//! Layered dashboard configuration.
//!
//! Settings live in a single JSON tree addressed by dotted paths such as
//! `api.timeout` or `ui.refresh_interval`. The tree is assembled in layers:
//!
//! ```text
//! defaults ──▶ environment overrides ──▶ config file ──▶ ENVWATCH__* vars
//! ```
//!
//! Every layer is applied with [`deep_merge`], so a layer only replaces the
//! keys it names. Numeric settings may carry bounds under a parallel
//! `validation.<path>` entry, checked by [`ConfigStore::validate`]. Values
//! from the file and environment layers that break their bounds are reset
//! to the environment default when loading.

mod environment;
mod merge;

pub use environment::Environment;
pub use merge::{deep_merge, merged};

use std::path::Path;

use config::{Config, ConfigError, File};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Prefix for configuration environment variables (`ENVWATCH__API__TIMEOUT`).
pub const ENV_PREFIX: &str = "ENVWATCH";

/// Built-in defaults shared by every environment.
pub fn defaults() -> Value {
    json!({
        "api": {
            "base_url": "http://localhost:8000",
            "timeout": 10000,
            "retry": { "attempts": 3, "delay": 1000 },
            "endpoints": {
                "insights": "/api/ai/insights",
                "anomalies": "/api/ai/anomalies",
                "predictions": "/api/ai/predictions",
                "patterns": "/api/ai/patterns",
                "violations": "/api/violations",
                "summary": "/api/summary",
                "series": "/api/series",
                "health": "/api/system/health"
            }
        },
        "ui": {
            "refresh_interval": 30000,
            "default_days": 30,
            "violations_limit": 10,
            "violations_limit_options": [5, 10, 20, 50, 100],
            "prediction_hours": 12,
            "series_max_points": 500,
            "utc_offset_minutes": -180
        },
        "validation": {
            "api": {
                "timeout": { "min": 1000, "max": 60000 }
            },
            "ui": {
                "refresh_interval": { "min": 5000, "max": 3600000 },
                "default_days": { "min": 1, "max": 365 },
                "violations_limit": { "min": 1, "max": 100 },
                "prediction_hours": { "min": 1, "max": 72 },
                "series_max_points": { "min": 5, "max": 2000 },
                "utc_offset_minutes": { "min": -720, "max": 840 }
            }
        },
        "features": {
            "ai_panels": true,
            "auto_refresh": true,
            "debug_logging": false
        },
        "logging": {
            "file": "envwatch.log",
            "level": "info"
        }
    })
}

/// Path-addressed configuration tree.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: Value,
    environment: Environment,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Environment::default())
    }
}

impl ConfigStore {
    /// Defaults with the given environment's overrides applied.
    pub fn new(environment: Environment) -> Self {
        let root = merged(&defaults(), &environment.overrides());
        Self { root, environment }
    }

    /// Wrap an existing tree without applying defaults.
    pub fn from_value(root: Value, environment: Environment) -> Self {
        Self { root, environment }
    }

    /// Build the full layered configuration.
    ///
    /// An optional file (any format the `config` crate understands, picked by
    /// extension) is merged over the environment defaults, then any
    /// `ENVWATCH__SECTION__KEY` environment variables.
    pub fn load(environment: Environment, file: Option<&Path>) -> Result<Self, ConfigError> {
        let baseline = Self::new(environment);
        let mut store = baseline.clone();

        if let Some(path) = file {
            let layer = Config::builder().add_source(File::from(path)).build()?;
            let overrides: Value = layer.try_deserialize()?;
            debug!("Merging config file {}", path.display());
            store.merge(&overrides);
        }

        let layer = Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let overrides: Value = layer.try_deserialize()?;
        if overrides.as_object().is_some_and(|o| !o.is_empty()) {
            debug!("Merging {} environment overrides", ENV_PREFIX);
            store.merge(&overrides);
        }

        store.enforce_bounds(&baseline);
        Ok(store)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The whole tree.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Look up a dotted path. Returns `None` if any segment is absent.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        segments(path).try_fold(&self.root, |node, key| node.as_object()?.get(key))
    }

    /// Value at `path`, or `default` if any segment is absent.
    pub fn get(&self, path: &str, default: Value) -> Value {
        self.lookup(path).cloned().unwrap_or(default)
    }

    pub fn get_u64(&self, path: &str, default: u64) -> u64 {
        self.lookup(path).and_then(Value::as_u64).unwrap_or(default)
    }

    pub fn get_i64(&self, path: &str, default: i64) -> i64 {
        self.lookup(path).and_then(Value::as_i64).unwrap_or(default)
    }

    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        self.lookup(path).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn get_str<'a>(&'a self, path: &str, default: &'a str) -> &'a str {
        self.lookup(path).and_then(Value::as_str).unwrap_or(default)
    }

    /// Write `value` at `path`, creating intermediate objects as needed.
    ///
    /// A non-object value sitting where an intermediate object is required
    /// is replaced by an empty object.
    pub fn set(&mut self, path: &str, value: Value) {
        let keys: Vec<&str> = segments(path).collect();
        let Some((last, parents)) = keys.split_last() else {
            self.root = value;
            return;
        };

        let mut node = &mut self.root;
        for key in parents {
            node = ensure_object(node)
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(node).insert(last.to_string(), value);
    }

    /// Check `value` against the bounds registered under `validation.<path>`.
    ///
    /// A path without a rule is always valid. With a rule, the value must be
    /// numeric and inside `[min, max]` (either bound may be omitted).
    pub fn validate(&self, path: &str, value: &Value) -> bool {
        let Some(rule) = self.lookup(&format!("validation.{}", path)) else {
            return true;
        };
        let Some(v) = value.as_f64() else {
            return false;
        };

        let min = rule.get("min").and_then(Value::as_f64);
        let max = rule.get("max").and_then(Value::as_f64);
        min.map_or(true, |min| v >= min) && max.map_or(true, |max| v <= max)
    }

    /// Validate then write. Returns false (and leaves the tree untouched)
    /// when the value is out of bounds.
    pub fn set_validated(&mut self, path: &str, value: Value) -> bool {
        if !self.validate(path, &value) {
            return false;
        }
        self.set(path, value);
        true
    }

    /// Deep-merge an override tree on top of the current one.
    pub fn merge(&mut self, overrides: &Value) {
        deep_merge(&mut self.root, overrides);
    }

    /// Every path that has a rule under `validation`.
    pub fn validated_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        if let Some(rules) = self.lookup("validation") {
            collect_rules(rules, "", &mut paths);
        }
        paths
    }

    /// Put back `fallback`'s value wherever the current one breaks its rule.
    /// Returns the paths that were reset.
    pub fn enforce_bounds(&mut self, fallback: &ConfigStore) -> Vec<String> {
        let mut reset = Vec::new();
        for path in self.validated_paths() {
            let Some(value) = self.lookup(&path).cloned() else {
                continue;
            };
            if self.validate(&path, &value) {
                continue;
            }
            if let Some(default) = fallback.lookup(&path).cloned() {
                warn!("Ignoring {} = {}: out of bounds, using {}", path, value, default);
                self.set(&path, default);
                reset.push(path);
            }
        }
        reset
    }
}

/// Walk a validation tree; a node with `min` or `max` is a rule.
fn collect_rules(node: &Value, prefix: &str, out: &mut Vec<String>) {
    let Some(map) = node.as_object() else {
        return;
    };
    if map.contains_key("min") || map.contains_key("max") {
        out.push(prefix.to_string());
        return;
    }
    for (key, child) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        collect_rules(child, &path, out);
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}
