//! Relay configuration derived from the live key-value store.

use crate::types::ConfigValues;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::warn;

pub const ENDPOINT_KEY: &str = "endpoint";
pub const TEAM_KEY: &str = "team";
pub const TOOL_KEY: &str = "tool";
pub const LOG_KEY: &str = "log";
pub const LOG_INTERVAL_KEY: &str = "log-interval";

pub const DEFAULT_TOOL: u32 = 1;
pub const DEFAULT_LOG_INTERVAL_MS: u64 = 5_000;

/// The five values the relay reads from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    /// Base URL without trailing slash.
    pub endpoint: Option<String>,
    pub team: Option<String>,
    pub tool: u32,
    pub logging_enabled: bool,
    pub log_interval: Duration,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            endpoint: None,
            team: None,
            tool: DEFAULT_TOOL,
            logging_enabled: false,
            log_interval: Duration::from_millis(DEFAULT_LOG_INTERVAL_MS),
        }
    }
}

/// A snapshot with both endpoint and team present.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveConfig {
    pub endpoint: String,
    pub team: String,
    pub tool: u32,
    pub logging_enabled: bool,
    pub log_interval: Duration,
}

impl ConfigSnapshot {
    pub fn from_values(values: &ConfigValues) -> Self {
        let endpoint = read_string(values, ENDPOINT_KEY)
            .map(|endpoint| endpoint.trim_end_matches('/').to_string())
            .filter(|endpoint| !endpoint.is_empty());

        let tool = match values.get(TOOL_KEY) {
            None | Some(Value::Null) => DEFAULT_TOOL,
            Some(value) => read_u64(value)
                .and_then(|tool| u32::try_from(tool).ok())
                .unwrap_or_else(|| {
                    warn!("Ignoring invalid {} value {}, using {}", TOOL_KEY, value, DEFAULT_TOOL);
                    DEFAULT_TOOL
                }),
        };

        let logging_enabled = values.get(LOG_KEY).and_then(read_bool).unwrap_or(false);

        let log_interval_ms = match values.get(LOG_INTERVAL_KEY) {
            None | Some(Value::Null) => DEFAULT_LOG_INTERVAL_MS,
            Some(value) => read_u64(value).filter(|ms| *ms > 0).unwrap_or_else(|| {
                warn!(
                    "Ignoring invalid {} value {}, using {}ms",
                    LOG_INTERVAL_KEY, value, DEFAULT_LOG_INTERVAL_MS
                );
                DEFAULT_LOG_INTERVAL_MS
            }),
        };

        Self {
            endpoint,
            team: read_string(values, TEAM_KEY),
            tool,
            logging_enabled,
            log_interval: Duration::from_millis(log_interval_ms),
        }
    }

    /// Build the key-value form from environment variables:
    /// `RELAY_ENDPOINT`, `RELAY_TEAM`, `RELAY_TOOL`, `RELAY_LOG` and
    /// `RELAY_LOG_INTERVAL_MS`. Unset variables are left out so the
    /// defaults apply.
    pub fn values_from_env() -> ConfigValues {
        Self::values_from(|variable| env::var(variable).ok())
    }

    /// Same as [`Self::values_from_env`], reading variables through `lookup`.
    pub fn values_from(lookup: impl Fn(&str) -> Option<String>) -> ConfigValues {
        let mut values = ConfigValues::new();
        let mappings = [
            ("RELAY_ENDPOINT", ENDPOINT_KEY),
            ("RELAY_TEAM", TEAM_KEY),
            ("RELAY_TOOL", TOOL_KEY),
            ("RELAY_LOG", LOG_KEY),
            ("RELAY_LOG_INTERVAL_MS", LOG_INTERVAL_KEY),
        ];

        for (variable, key) in mappings {
            if let Some(value) = lookup(variable) {
                values.insert(key.to_string(), Value::String(value));
            }
        }

        values
    }

    pub fn is_active(&self) -> bool {
        self.endpoint.is_some() && self.team.is_some()
    }

    pub fn active(&self) -> Option<ActiveConfig> {
        match (&self.endpoint, &self.team) {
            (Some(endpoint), Some(team)) => Some(ActiveConfig {
                endpoint: endpoint.clone(),
                team: team.clone(),
                tool: self.tool,
                logging_enabled: self.logging_enabled,
                log_interval: self.log_interval,
            }),
            _ => None,
        }
    }
}

fn read_string(values: &ConfigValues, key: &str) -> Option<String> {
    match values.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn read_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn read_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
