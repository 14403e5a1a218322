//! Environment-driven configuration (spec §6; ADDITIONS §Configuration).
//!
//! Unlike the JSON5-file configuration this crate's lineage usually favors,
//! this spec names environment variables as the core's own external
//! contract, so `Settings::from_env` reads `std::env::var` directly via the
//! shared `syslog_core::config` helpers instead of a file loader.

use std::time::Duration;

use syslog_core::config::{env_var_bool_or, env_var_or, env_var_parsed_or};
use syslog_core::{LogFormat, LoggingConfig};

use crate::dedup::{DEFAULT_MAX_ENTRIES, DEFAULT_WINDOW};
use crate::framer::{DEFAULT_MAX_BUFFER, DEFAULT_MAX_FRAME, DEFAULT_MAX_PREFIX};

/// Default read-chunk size for stream connections (spec §4.G default 8 KiB).
pub const DEFAULT_READ_CHUNK: usize = 8 * 1024;
/// Default simultaneous stream session cap (spec §4.G default 100).
pub const DEFAULT_MAX_CONCURRENT: usize = 100;
/// Default per-connection inactivity timeout (spec §4.G default 5 min).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Default shutdown grace period (spec §4.H default 2s).
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Complete collector configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub udp_port: u16,
    pub tls_port: u16,
    pub log_dir: String,
    pub cert_file: String,
    pub key_file: String,
    pub enable_udp: bool,
    pub enable_tls: bool,

    pub window: Duration,
    pub max_entries: usize,

    pub max_buffer: usize,
    pub max_prefix: usize,
    pub max_frame: usize,

    pub read_chunk: usize,
    pub max_concurrent: usize,
    pub read_timeout: Duration,
    pub shutdown_grace: Duration,

    pub logging: LoggingConfig,
}

impl Settings {
    /// Load settings from the environment, falling back to the spec's
    /// defaults for anything unset (spec §6 table).
    pub fn from_env() -> Self {
        Self {
            udp_port: env_var_parsed_or("SYSLOG_UDP_PORT", 514),
            tls_port: env_var_parsed_or("SYSLOG_TLS_PORT", 6514),
            log_dir: env_var_or("SYSLOG_LOG_DIR", "logs"),
            cert_file: env_var_or("SYSLOG_CERT_FILE", "cert.pem"),
            key_file: env_var_or("SYSLOG_KEY_FILE", "key.pem"),
            enable_udp: env_var_bool_or("SYSLOG_ENABLE_UDP", true),
            enable_tls: env_var_bool_or("SYSLOG_ENABLE_TLS", true),

            window: Duration::from_secs(env_var_parsed_or(
                "SYSLOG_DEDUP_WINDOW_SECS",
                DEFAULT_WINDOW.as_secs(),
            )),
            max_entries: env_var_parsed_or("SYSLOG_DEDUP_MAX_ENTRIES", DEFAULT_MAX_ENTRIES),

            max_buffer: env_var_parsed_or("SYSLOG_MAX_BUFFER", DEFAULT_MAX_BUFFER),
            max_prefix: env_var_parsed_or("SYSLOG_MAX_PREFIX", DEFAULT_MAX_PREFIX),
            max_frame: env_var_parsed_or("SYSLOG_MAX_FRAME", DEFAULT_MAX_FRAME),

            read_chunk: env_var_parsed_or("SYSLOG_READ_CHUNK", DEFAULT_READ_CHUNK),
            max_concurrent: env_var_parsed_or("SYSLOG_MAX_CONCURRENT", DEFAULT_MAX_CONCURRENT),
            read_timeout: Duration::from_secs(env_var_parsed_or(
                "SYSLOG_READ_TIMEOUT_SECS",
                DEFAULT_READ_TIMEOUT.as_secs(),
            )),
            shutdown_grace: Duration::from_secs(env_var_parsed_or(
                "SYSLOG_SHUTDOWN_GRACE_SECS",
                DEFAULT_SHUTDOWN_GRACE.as_secs(),
            )),

            logging: LoggingConfig {
                level: env_var_or("SYSLOG_LOG_LEVEL", "info"),
                format: if env_var_bool_or("SYSLOG_LOG_JSON", false) {
                    LogFormat::Json
                } else {
                    LogFormat::Text
                },
            },
        }
    }

    /// Apply CLI overrides on top of the loaded environment settings.
    pub fn apply_args(mut self, args: &syslog_runtime::Args) -> Self {
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
        if let Some(ref log_dir) = args.log_dir {
            self.log_dir = log_dir.clone();
        }
        if let Some(udp_port) = args.udp_port {
            self.udp_port = udp_port;
        }
        if let Some(tls_port) = args.tls_port {
            self.tls_port = tls_port;
        }
        self
    }

    /// At least one transport must be enabled and ports must be nonzero
    /// (spec ADDITIONS §Configuration, mirroring `validate_config` in the
    /// teacher's config loader).
    pub fn validate(&self) -> Result<(), String> {
        if !self.enable_udp && !self.enable_tls {
            return Err("at least one of SYSLOG_ENABLE_UDP/SYSLOG_ENABLE_TLS must be true".into());
        }
        if self.enable_udp && self.udp_port == 0 {
            return Err("SYSLOG_UDP_PORT must be nonzero when UDP is enabled".into());
        }
        if self.enable_tls && self.tls_port == 0 {
            return Err("SYSLOG_TLS_PORT must be nonzero when TLS is enabled".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let settings = Settings {
            udp_port: 514,
            tls_port: 6514,
            log_dir: "logs".to_string(),
            cert_file: "cert.pem".to_string(),
            key_file: "key.pem".to_string(),
            enable_udp: true,
            enable_tls: true,
            window: DEFAULT_WINDOW,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_buffer: DEFAULT_MAX_BUFFER,
            max_prefix: DEFAULT_MAX_PREFIX,
            max_frame: DEFAULT_MAX_FRAME,
            read_chunk: DEFAULT_READ_CHUNK,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            logging: LoggingConfig::default(),
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_rejects_both_transports_disabled() {
        let mut settings = Settings::from_env();
        settings.enable_udp = false;
        settings.enable_tls = false;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_port_for_enabled_transport() {
        let mut settings = Settings::from_env();
        settings.enable_udp = true;
        settings.udp_port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn apply_args_overrides_only_set_fields() {
        let settings = Settings::from_env();
        let original_tls_port = settings.tls_port;
        let args = syslog_runtime::Args {
            log_level: Some("debug".to_string()),
            log_dir: None,
            udp_port: Some(9999),
            tls_port: None,
        };
        let settings = settings.apply_args(&args);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.udp_port, 9999);
        assert_eq!(settings.tls_port, original_tls_port);
    }
}
