//! Component A: the parsed record and its serialized form.

use serde::{Deserialize, Serialize};

/// Syslog facility, derived from `priority >> 3`.
///
/// Standard codes 0-23 render under their conventional short name; anything
/// outside that range (a malformed wire value couldn't otherwise reach this
/// far) renders as `facility{n}`.
pub const FACILITY_NAMES: [&str; 24] = [
    "kern",
    "user",
    "mail",
    "daemon",
    "auth",
    "syslog",
    "lpr",
    "news",
    "uucp",
    "cron",
    "authpriv",
    "ftp",
    "ntp",
    "security",
    "console",
    "solaris-cron",
    "local0",
    "local1",
    "local2",
    "local3",
    "local4",
    "local5",
    "local6",
    "local7",
];

/// Syslog severity, derived from `priority & 7`.
pub const SEVERITY_NAMES: [&str; 8] = [
    "emergency",
    "alert",
    "critical",
    "error",
    "warning",
    "notice",
    "info",
    "debug",
];

/// The default PRI used when no priority could be determined from the wire
/// (`user` facility, `notice` severity — see spec §3 Invariant).
pub const DEFAULT_PRIORITY: u8 = 13;

/// Render a facility code (0-23, or larger) as its symbolic name.
pub fn facility_name(priority: u8) -> String {
    let code = (priority >> 3) as usize;
    FACILITY_NAMES
        .get(code)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("facility{code}"))
}

/// Render a severity code (0-7) as its symbolic name.
pub fn severity_name(priority: u8) -> String {
    let code = (priority & 7) as usize;
    SEVERITY_NAMES[code].to_string()
}

/// The wire format a message was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireFormat {
    #[serde(rename = "RFC5424")]
    Rfc5424,
    #[serde(rename = "RFC3164")]
    Rfc3164,
}

impl WireFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireFormat::Rfc5424 => "RFC5424",
            WireFormat::Rfc3164 => "RFC3164",
        }
    }
}

/// An immutable parsed syslog record, ready for dedup and persistence.
///
/// Field order here is the JSON key order on disk (spec §4.A): it matters,
/// don't reorder without checking downstream consumers of the log files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub priority: u8,
    pub facility: String,
    pub severity: String,
    pub timestamp: String,
    pub hostname: String,
    pub message: String,
    pub source_ip: String,
    pub received_at: String,
    pub format: WireFormat,
    pub raw: String,
}

impl ParsedMessage {
    /// Build a record from the discriminated fields, deriving `facility`
    /// and `severity` from `priority` so the two can never drift apart.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        priority: u8,
        timestamp: String,
        hostname: String,
        message: String,
        source_ip: String,
        received_at: String,
        format: WireFormat,
        raw: String,
    ) -> Self {
        Self {
            priority,
            facility: facility_name(priority),
            severity: severity_name(priority),
            timestamp,
            hostname,
            message,
            source_ip,
            received_at,
            format,
            raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facility_name_standard_codes() {
        assert_eq!(facility_name(0), "kern");
        assert_eq!(facility_name(8), "user");
        assert_eq!(facility_name(13 << 3), "security");
        assert_eq!(facility_name(15 << 3), "solaris-cron");
        assert_eq!(facility_name(23 << 3), "local7");
    }

    #[test]
    fn facility_name_unknown_code_renders_generic() {
        assert_eq!(facility_name(24 << 3), "facility24");
    }

    #[test]
    fn severity_name_all_codes() {
        let expected = [
            "emergency", "alert", "critical", "error", "warning", "notice", "info", "debug",
        ];
        for (code, name) in expected.iter().enumerate() {
            assert_eq!(severity_name(code as u8), *name);
        }
    }

    #[test]
    fn new_derives_facility_and_severity_from_priority() {
        let msg = ParsedMessage::new(
            13,
            String::new(),
            String::new(),
            "hi".to_string(),
            "127.0.0.1".to_string(),
            "2026-01-01T00:00:00Z".to_string(),
            WireFormat::Rfc3164,
            "<13>hi".to_string(),
        );
        assert_eq!(msg.facility, "user");
        assert_eq!(msg.severity, "notice");
    }

    #[test]
    fn serializes_timestamp_as_string_not_number() {
        let msg = ParsedMessage::new(
            14,
            "2026-01-01T00:00:00Z".to_string(),
            "host1".to_string(),
            "hello".to_string(),
            "10.0.0.1".to_string(),
            "2026-01-01T00:00:00.123456Z".to_string(),
            WireFormat::Rfc5424,
            "raw".to_string(),
        );
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"timestamp\":\"2026-01-01T00:00:00Z\""));
        assert!(json.contains("\"format\":\"RFC5424\""));
    }
}
