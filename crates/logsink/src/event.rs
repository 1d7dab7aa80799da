// Copyright 2025-Present the logsink authors
// SPDX-License-Identifier: Apache-2.0

//! Event normalization.
//!
//! [`normalize`] turns an arbitrary inbound text payload into a canonical
//! [`Event`]. It is total by design: malformed input degrades into a generic
//! event carrying the payload verbatim instead of being dropped, so nothing
//! past this boundary ever sees a parse error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

/// Level assigned when the payload carries none.
pub const DEFAULT_LEVEL: &str = "INFO";

/// Source assigned when the payload carries none.
pub const DEFAULT_SOURCE: &str = "UNKNOWN";

/// Stored when neither the structured message field nor the raw payload
/// carries any text. Keeps the non-empty message invariant for empty
/// datagrams.
const EMPTY_MESSAGE: &str = "<empty>";

/// One normalized log record, as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Unix seconds, UTC. Always present; defaulted to ingestion time when
    /// the payload has no usable timestamp.
    pub timestamp: i64,
    /// Log level, uppercased.
    pub level: String,
    /// Producer identifier.
    pub source: String,
    /// Optional grouping key.
    pub category: Option<String>,
    /// Message body. Never empty.
    pub message: String,
}

/// Inbound payload shape. Every field is optional; any payload that does
/// not deserialize into this is treated as a raw message body.
#[derive(Debug, Deserialize)]
struct RawPayload {
    timestamp: Option<String>,
    level: Option<String>,
    source: Option<String>,
    category: Option<String>,
    message: Option<String>,
}

/// Normalize an inbound payload into a canonical [`Event`].
///
/// Structured payloads have their fields extracted with per-field defaults;
/// anything else becomes a fallback event timestamped at ingestion time with
/// the payload as its message. This function never fails.
pub fn normalize(payload: &str) -> Event {
    let raw = match serde_json::from_str::<RawPayload>(payload) {
        Ok(raw) => raw,
        Err(_) => return fallback(payload),
    };

    // Empty strings are treated like absent fields so stored rows always
    // satisfy the non-empty level/source/message invariants.
    let timestamp = raw
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(|| Utc::now().timestamp());
    let level = raw
        .level
        .filter(|l| !l.is_empty())
        .map(|l| l.to_uppercase())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    let source = raw
        .source
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    let message = raw
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| non_empty(payload).to_string());

    Event {
        timestamp,
        level,
        source,
        category: raw.category,
        message,
    }
}

/// Fallback event for payloads that are not structured data.
fn fallback(payload: &str) -> Event {
    Event {
        timestamp: Utc::now().timestamp(),
        level: DEFAULT_LEVEL.to_string(),
        source: DEFAULT_SOURCE.to_string(),
        category: None,
        message: non_empty(payload).to_string(),
    }
}

fn non_empty(payload: &str) -> &str {
    if payload.is_empty() {
        EMPTY_MESSAGE
    } else {
        payload
    }
}

/// Parse an ISO-8601-like timestamp into Unix seconds UTC.
///
/// Values with an offset are converted to UTC; values without one are
/// assumed to already be UTC. Returns `None` for anything unparseable so
/// the caller can fall back to ingestion time.
fn parse_timestamp(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).timestamp());
    }
    if let Ok(naive) = raw.parse::<NaiveDateTime>() {
        return Some(naive.and_utc().timestamp());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().timestamp());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    #[test]
    fn test_structured_payload() {
        let event = normalize(
            r#"{"timestamp":"2024-01-01T00:00:00+05:00","level":"warn","source":"agentA","category":"disk","message":"disk low"}"#,
        );
        assert_eq!(event.timestamp, 1_704_049_200);
        assert_eq!(event.level, "WARN");
        assert_eq!(event.source, "agentA");
        assert_eq!(event.category.as_deref(), Some("disk"));
        assert_eq!(event.message, "disk low");
    }

    #[test]
    fn test_timestamp_without_offset_is_utc() {
        let event = normalize(r#"{"timestamp":"2024-01-01T00:00:00","message":"x"}"#);
        assert_eq!(event.timestamp, 1_704_067_200);
    }

    #[test]
    fn test_timestamp_with_space_separator() {
        let event = normalize(r#"{"timestamp":"2024-01-01 00:00:00","message":"x"}"#);
        assert_eq!(event.timestamp, 1_704_067_200);
    }

    #[test]
    fn test_date_only_timestamp() {
        let event = normalize(r#"{"timestamp":"2024-01-01","message":"x"}"#);
        assert_eq!(event.timestamp, 1_704_067_200);
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let before = now();
        let event = normalize(r#"{"message":"x"}"#);
        let after = now();
        assert!(event.timestamp >= before && event.timestamp <= after);
    }

    #[test]
    fn test_unparseable_timestamp_defaults_to_now() {
        let before = now();
        let event = normalize(r#"{"timestamp":"next tuesday","message":"x"}"#);
        let after = now();
        assert!(event.timestamp >= before && event.timestamp <= after);
    }

    #[test]
    fn test_field_defaults() {
        let event = normalize(r#"{"message":"hello"}"#);
        assert_eq!(event.level, "INFO");
        assert_eq!(event.source, "UNKNOWN");
        assert_eq!(event.category, None);
        assert_eq!(event.message, "hello");
    }

    #[test]
    fn test_missing_message_falls_back_to_raw_payload() {
        let payload = r#"{"level":"error"}"#;
        let event = normalize(payload);
        assert_eq!(event.level, "ERROR");
        assert_eq!(event.message, payload);
    }

    #[test]
    fn test_empty_message_field_falls_back_to_raw_payload() {
        let payload = r#"{"message":""}"#;
        let event = normalize(payload);
        assert_eq!(event.message, payload);
    }

    #[test]
    fn test_fallback_on_malformed_input() {
        let before = now();
        let event = normalize("not-json-at-all");
        assert_eq!(event.level, "INFO");
        assert_eq!(event.source, "UNKNOWN");
        assert_eq!(event.category, None);
        assert_eq!(event.message, "not-json-at-all");
        assert!(event.timestamp >= before);
    }

    #[test]
    fn test_fallback_on_non_object_json() {
        let event = normalize("[1,2,3]");
        assert_eq!(event.message, "[1,2,3]");
        assert_eq!(event.source, "UNKNOWN");
    }

    #[test]
    fn test_empty_payload_gets_placeholder_message() {
        let event = normalize("");
        assert!(!event.message.is_empty());
    }

    proptest! {
        #[test]
        fn normalize_is_total(payload in any::<String>()) {
            let event = normalize(&payload);
            prop_assert!(!event.message.is_empty());
            prop_assert!(!event.level.is_empty());
            prop_assert!(!event.source.is_empty());
        }
    }
}
