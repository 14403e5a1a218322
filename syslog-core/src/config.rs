//! Logging configuration and small environment-variable helpers shared by
//! every binary built on top of this crate.

use serde::{Deserialize, Serialize};

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format.
    Text,
    /// Structured JSON format, one object per line.
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Text
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Read an environment variable, falling back to `default` when unset or empty.
pub fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Read an environment variable and parse it, falling back to `default` when
/// unset or unparseable. A malformed value is logged at `warn` rather than
/// treated as a startup failure.
pub fn env_var_parsed_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) if !raw.is_empty() => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "invalid environment value, using default");
            default
        }),
        _ => default,
    }
}

/// Read a boolean-ish environment variable ("true"/"false", "1"/"0", case
/// insensitive), falling back to `default` when unset or unrecognized.
pub fn env_var_bool_or(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => {
                tracing::warn!(key, value = %raw, "invalid boolean environment value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_logging_config() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LogFormat::Text);
    }

    #[test]
    fn env_var_or_falls_back() {
        assert_eq!(env_var_or("SYSLOG_CORE_TEST_UNSET_KEY", "fallback"), "fallback");
    }

    #[test]
    fn env_var_parsed_or_falls_back_on_garbage() {
        unsafe {
            std::env::set_var("SYSLOG_CORE_TEST_PARSE_KEY", "not-a-number");
        }
        let value: u16 = env_var_parsed_or("SYSLOG_CORE_TEST_PARSE_KEY", 514);
        assert_eq!(value, 514);
        unsafe {
            std::env::remove_var("SYSLOG_CORE_TEST_PARSE_KEY");
        }
    }

    #[test]
    fn env_var_bool_or_variants() {
        unsafe {
            std::env::set_var("SYSLOG_CORE_TEST_BOOL_KEY", "FALSE");
        }
        assert!(!env_var_bool_or("SYSLOG_CORE_TEST_BOOL_KEY", true));
        unsafe {
            std::env::remove_var("SYSLOG_CORE_TEST_BOOL_KEY");
        }
        assert!(env_var_bool_or("SYSLOG_CORE_TEST_BOOL_KEY", true));
    }
}
