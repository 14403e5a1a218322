//! Component B: discriminate RFC3164/RFC5424, extract fields, classify
//! severity/facility.
//!
//! The parser holds no state and performs no I/O; it is a pure function of
//! its inputs, which makes it trivially testable from both transports.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::message::{DEFAULT_PRIORITY, ParsedMessage, WireFormat};

// `MMM dd HH:MM:SS` with an optionally space-padded day, per RFC 3164.
static RFC3164_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]{3})\s+(\d{1,2})\s+(\d{2}):(\d{2}):(\d{2})\s(.*)$").unwrap()
});

/// Parse one decoded text line into a record. Never fails outright: a
/// malformed body past a well-formed PRI still yields a record with
/// `priority` set and the raw tail as `message` (spec §4.B, §7).
pub fn parse(raw: &str, source_ip: &str, received_at: &str) -> ParsedMessage {
    let input = raw.strip_prefix('\u{FEFF}').unwrap_or(raw);

    if !input.starts_with('<') {
        return unstructured(input, raw, source_ip, received_at);
    }

    match extract_pri(input) {
        Some((priority, after_pri)) if looks_like_rfc5424(after_pri) => {
            parse_rfc5424(priority, after_pri, raw, source_ip, received_at)
        }
        Some((priority, after_pri)) => {
            parse_rfc3164(priority, after_pri, raw, source_ip, received_at)
        }
        None => unstructured(input, raw, source_ip, received_at),
    }
}

fn unstructured(body: &str, raw: &str, source_ip: &str, received_at: &str) -> ParsedMessage {
    tracing::debug!(source_ip, "no valid PRI found, classifying as unstructured");
    ParsedMessage::new(
        DEFAULT_PRIORITY,
        String::new(),
        String::new(),
        body.to_string(),
        source_ip.to_string(),
        received_at.to_string(),
        WireFormat::Rfc3164,
        raw.to_string(),
    )
}

/// Read `<NN>` where NN is 1-3 ASCII decimal digits, 0 <= NN <= 191.
/// Returns the priority and the slice immediately following `>`.
fn extract_pri(input: &str) -> Option<(u8, &str)> {
    let bytes = input.as_bytes();
    let close = bytes.iter().take(5).position(|&b| b == b'>')?;
    if close < 2 {
        // need at least one digit between '<' and '>'
        return None;
    }
    let digits = &input[1..close];
    if digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    if value > 191 {
        return None;
    }
    Some((value as u8, &input[close + 1..]))
}

/// RFC5424 iff the character after `>` is a single ASCII digit followed by
/// a space (the version field).
fn looks_like_rfc5424(after_pri: &str) -> bool {
    let mut chars = after_pri.chars();
    matches!((chars.next(), chars.next()), (Some(d), Some(' ')) if d.is_ascii_digit())
}

fn take_token(s: &str) -> Option<(&str, &str)> {
    let idx = s.find(' ')?;
    Some((&s[..idx], &s[idx + 1..]))
}

fn nil_to_string(tok: &str) -> String {
    if tok == "-" { String::new() } else { tok.to_string() }
}

fn parse_rfc5424(
    priority: u8,
    after_pri: &str,
    raw: &str,
    source_ip: &str,
    received_at: &str,
) -> ParsedMessage {
    // after_pri = "<digit> <rest>"; skip the version digit and the space.
    let rest = &after_pri[2..];

    let fields = take_token(rest)
        .and_then(|(timestamp, r)| take_token(r).map(|(hostname, r)| (timestamp, hostname, r)))
        .and_then(|(timestamp, hostname, r)| {
            take_token(r).map(|(_app_name, r)| (timestamp, hostname, r))
        })
        .and_then(|(timestamp, hostname, r)| {
            take_token(r).map(|(_proc_id, r)| (timestamp, hostname, r))
        })
        .and_then(|(timestamp, hostname, r)| {
            take_token(r).map(|(_msg_id, r)| (timestamp, hostname, r))
        });

    let (timestamp_tok, hostname_tok, sd_and_message) = match fields {
        Some(v) => v,
        None => {
            tracing::debug!(source_ip, "malformed RFC5424 body, keeping raw tail as message");
            return ParsedMessage::new(
                priority,
                String::new(),
                String::new(),
                rest.to_string(),
                source_ip.to_string(),
                received_at.to_string(),
                WireFormat::Rfc5424,
                raw.to_string(),
            );
        }
    };

    let timestamp = parse_rfc5424_timestamp(timestamp_tok);
    let hostname = nil_to_string(hostname_tok);
    let message = skip_structured_data(sd_and_message).to_string();

    ParsedMessage::new(
        priority,
        timestamp,
        hostname,
        message,
        source_ip.to_string(),
        received_at.to_string(),
        WireFormat::Rfc5424,
        raw.to_string(),
    )
}

/// Consume the STRUCTURED-DATA section (`-` or one or more balanced
/// `[SD-ID key="value" ...]` groups, honoring backslash-escaped quotes and
/// brackets inside quoted values) and return the remaining MSG slice.
fn skip_structured_data(s: &str) -> &str {
    let s = s.strip_prefix(' ').unwrap_or(s);

    if let Some(rest) = s.strip_prefix('-') {
        return rest.strip_prefix(' ').unwrap_or(rest);
    }

    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i] == b'[' {
        i += 1;
        let mut in_quotes = false;
        while i < bytes.len() {
            let c = bytes[i];
            if c == b'\\' && i + 1 < bytes.len() {
                i += 2;
                continue;
            }
            if c == b'"' {
                in_quotes = !in_quotes;
                i += 1;
                continue;
            }
            if c == b']' && !in_quotes {
                i += 1;
                break;
            }
            i += 1;
        }

        if i < bytes.len() && bytes[i] == b' ' && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            i += 1;
        } else {
            break;
        }
    }

    let rest = &s[i..];
    rest.strip_prefix(' ').unwrap_or(rest)
}

fn parse_rfc5424_timestamp(tok: &str) -> String {
    if tok == "-" {
        return String::new();
    }
    match chrono::DateTime::parse_from_rfc3339(tok) {
        Ok(dt) => dt
            .with_timezone(&chrono::Utc)
            .format("%Y-%m-%dT%H:%M:%S%.fZ")
            .to_string(),
        Err(_) => String::new(),
    }
}

fn parse_rfc3164(
    priority: u8,
    after_pri: &str,
    raw: &str,
    source_ip: &str,
    received_at: &str,
) -> ParsedMessage {
    let Some(caps) = RFC3164_TIMESTAMP.captures(after_pri) else {
        tracing::debug!(source_ip, "malformed RFC3164 timestamp, keeping raw tail as message");
        return ParsedMessage::new(
            priority,
            String::new(),
            String::new(),
            after_pri.to_string(),
            source_ip.to_string(),
            received_at.to_string(),
            WireFormat::Rfc3164,
            raw.to_string(),
        );
    };

    let month = &caps[1];
    let day: u32 = caps[2].parse().unwrap_or(1);
    let hour: u32 = caps[3].parse().unwrap_or(0);
    let minute: u32 = caps[4].parse().unwrap_or(0);
    let second: u32 = caps[5].parse().unwrap_or(0);
    let remainder = &caps[6];

    let timestamp = rfc3164_timestamp(month, day, hour, minute, second).unwrap_or_default();
    let (hostname, message) = take_token(remainder).unwrap_or((remainder, ""));

    ParsedMessage::new(
        priority,
        timestamp,
        hostname.to_string(),
        message.to_string(),
        source_ip.to_string(),
        received_at.to_string(),
        WireFormat::Rfc3164,
        raw.to_string(),
    )
}

fn month_number(abbr: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = abbr.to_ascii_lowercase();
    MONTHS.iter().position(|m| *m == lower).map(|i| i as u32 + 1)
}

/// Attach the current local year to an RFC3164 timestamp; if the result
/// lands more than 24h in the future (the sender's message is from late
/// December, observed in early January), assume it belongs to the prior
/// year instead (decided open question, see DESIGN.md).
fn rfc3164_timestamp(month: &str, day: u32, hour: u32, minute: u32, second: u32) -> Option<String> {
    let month_num = month_number(month)?;
    let now_local = Local::now().naive_local();
    let year = now_local.year();

    let date = NaiveDate::from_ymd_opt(year, month_num, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    let mut dt = date.and_time(time);

    if dt.signed_duration_since(now_local) > Duration::hours(24) {
        if let Some(prior) = NaiveDate::from_ymd_opt(year - 1, month_num, day) {
            dt = prior.and_time(time);
        }
    }

    Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udp_rfc3164_basic() {
        let msg = parse(
            "<13>Oct 31 12:00:00 server01 Test message",
            "10.0.0.1",
            "2026-07-27T00:00:00.000000Z",
        );
        assert_eq!(msg.priority, 13);
        assert_eq!(msg.facility, "user");
        assert_eq!(msg.severity, "notice");
        assert_eq!(msg.hostname, "server01");
        assert_eq!(msg.message, "Test message");
        assert_eq!(msg.format, WireFormat::Rfc3164);
    }

    #[test]
    fn udp_rfc5424_with_structured_data() {
        let msg = parse(
            r#"<14>1 2025-10-31T12:00:00.000Z host1 webapp 99 REQ001 [request@1 method="GET"] Request done"#,
            "10.0.0.2",
            "2026-07-27T00:00:00.000000Z",
        );
        assert_eq!(msg.format, WireFormat::Rfc5424);
        assert_eq!(msg.hostname, "host1");
        assert_eq!(msg.message, "Request done");
        assert_eq!(msg.severity, "info");
    }

    #[test]
    fn rfc5424_nil_fields_become_empty_strings() {
        let msg = parse("<14>1 - - - - - - Just a message", "127.0.0.1", "now");
        assert_eq!(msg.timestamp, "");
        assert_eq!(msg.hostname, "");
        assert_eq!(msg.message, "Just a message");
    }

    #[test]
    fn rfc5424_escaped_quotes_in_structured_data() {
        let msg = parse(
            r#"<165>1 2023-01-01T00:00:00Z host app - - [test@123 key="value with \"quotes\""] Message"#,
            "127.0.0.1",
            "now",
        );
        assert_eq!(msg.message, "Message");
    }

    #[test]
    fn rfc5424_multiple_sd_elements() {
        let msg = parse(
            r#"<165>1 2023-01-01T00:00:00Z host app - - [first@123 a="1"] [second@456 b="2"] Message"#,
            "127.0.0.1",
            "now",
        );
        assert_eq!(msg.message, "Message");
    }

    #[test]
    fn pri_zero_and_191_are_accepted() {
        let low = parse("<0>x", "127.0.0.1", "now");
        assert_eq!(low.priority, 0);
        assert_eq!(low.facility, "kern");
        assert_eq!(low.severity, "emergency");

        let high = parse("<191>x", "127.0.0.1", "now");
        assert_eq!(high.priority, 191);
        assert_eq!(high.facility, "local7");
        assert_eq!(high.severity, "debug");
    }

    #[test]
    fn pri_192_is_rejected_and_defaults() {
        let msg = parse("<192>something", "127.0.0.1", "now");
        assert_eq!(msg.priority, DEFAULT_PRIORITY);
        assert_eq!(msg.message, "<192>something");
    }

    #[test]
    fn non_numeric_pri_defaults_to_unstructured() {
        let msg = parse("<abc>something", "127.0.0.1", "now");
        assert_eq!(msg.priority, DEFAULT_PRIORITY);
        assert_eq!(msg.message, "<abc>something");
    }

    #[test]
    fn input_without_leading_angle_bracket_is_unstructured() {
        let msg = parse("plain text, no PRI at all", "127.0.0.1", "now");
        assert_eq!(msg.priority, DEFAULT_PRIORITY);
        assert_eq!(msg.format, WireFormat::Rfc3164);
        assert_eq!(msg.message, "plain text, no PRI at all");
    }

    #[test]
    fn malformed_rfc3164_body_keeps_priority_and_raw_tail_as_message() {
        let msg = parse("<34>not a valid timestamp at all", "127.0.0.1", "now");
        assert_eq!(msg.priority, 34);
        assert_eq!(msg.timestamp, "");
        assert_eq!(msg.message, "not a valid timestamp at all");
    }

    #[test]
    fn malformed_rfc5424_body_keeps_priority_and_raw_tail_as_message() {
        let msg = parse("<34>1 onlyonetoken", "127.0.0.1", "now");
        assert_eq!(msg.priority, 34);
        assert_eq!(msg.message, "onlyonetoken");
    }

    #[test]
    fn bom_is_stripped() {
        let msg = parse(
            "\u{FEFF}<14>1 2023-01-01T00:00:00Z host app - - - Message with BOM",
            "127.0.0.1",
            "now",
        );
        assert_eq!(msg.format, WireFormat::Rfc5424);
        assert_eq!(msg.message, "Message with BOM");
    }

    #[test]
    fn severity_routing_across_all_eight_severities() {
        for pri in 8u8..=15 {
            let msg = parse(
                &format!("<{pri}>Oct 11 22:14:15 server app: hi"),
                "127.0.0.1",
                "now",
            );
            assert_eq!(msg.facility, "user");
            assert_eq!(msg.severity, crate::message::SEVERITY_NAMES[(pri & 7) as usize]);
        }
    }
}
