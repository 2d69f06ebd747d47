//! Deployment environment detection and per-environment overrides.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde_json::{json, Value};

/// The deployment environment the dashboard is talking to.
///
/// Detection is a pure function of a host name; the caller decides which
/// host to inspect (usually the API base URL) or passes an explicit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Environment {
    Development,
    Staging,
    /// Used when there is no host to inspect.
    #[default]
    Production,
}

impl Environment {
    /// Classify a host name.
    ///
    /// `localhost` and loopback addresses are development, hosts containing
    /// "staging" or "test" are staging, everything else is production.
    pub fn detect(host: Option<&str>) -> Self {
        let Some(host) = host.map(|h| h.trim().trim_matches(|c| c == '[' || c == ']')) else {
            return Environment::default();
        };
        if host.is_empty() {
            return Environment::default();
        }

        let host = host.to_ascii_lowercase();
        if host == "localhost" || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback()) {
            Environment::Development
        } else if host.contains("staging") || host.contains("test") {
            Environment::Staging
        } else {
            Environment::Production
        }
    }

    /// Classify the host of a base URL. Unparsable URLs have no host context.
    pub fn from_base_url(url: &str) -> Self {
        let parsed = reqwest::Url::parse(url).ok();
        Self::detect(parsed.as_ref().and_then(|u| u.host_str()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Settings layered over the defaults for this environment.
    pub fn overrides(&self) -> Value {
        match self {
            Environment::Development => json!({
                "ui": { "refresh_interval": 10000 },
                "features": { "debug_logging": true },
                "logging": { "level": "debug" }
            }),
            Environment::Staging => json!({
                "ui": { "refresh_interval": 20000 },
                "features": { "debug_logging": false }
            }),
            Environment::Production => json!({
                "api": { "timeout": 15000 },
                "features": { "debug_logging": false }
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_development_hosts() {
        assert_eq!(Environment::detect(Some("localhost")), Environment::Development);
        assert_eq!(Environment::detect(Some("127.0.0.1")), Environment::Development);
        assert_eq!(Environment::detect(Some("[::1]")), Environment::Development);
        assert_eq!(Environment::detect(Some("LOCALHOST")), Environment::Development);
    }

    #[test]
    fn test_detect_staging_hosts() {
        assert_eq!(
            Environment::detect(Some("staging.monitor.example.com")),
            Environment::Staging
        );
        assert_eq!(Environment::detect(Some("test-box.lan")), Environment::Staging);
    }

    #[test]
    fn test_detect_production_and_missing_host() {
        assert_eq!(Environment::detect(Some("monitor.example.com")), Environment::Production);
        assert_eq!(Environment::detect(Some("10.0.0.5")), Environment::Production);
        assert_eq!(Environment::detect(None), Environment::Production);
        assert_eq!(Environment::detect(Some("")), Environment::Production);
    }

    #[test]
    fn test_from_base_url() {
        assert_eq!(
            Environment::from_base_url("http://localhost:8000"),
            Environment::Development
        );
        assert_eq!(
            Environment::from_base_url("https://staging.example.com/api"),
            Environment::Staging
        );
        assert_eq!(Environment::from_base_url("not a url"), Environment::Production);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Development));
        assert_eq!("Production".parse::<Environment>(), Ok(Environment::Production));
        assert!("qa".parse::<Environment>().is_err());
    }
}
