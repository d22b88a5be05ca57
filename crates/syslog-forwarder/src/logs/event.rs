// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use tracing::warn;

use crate::logs::constants::EVENT_OVERHEAD_BYTES;
use crate::util::{now_millis, truncate_on_char_boundary};

/// One captured log line.
///
/// `timestamp` is the originating time in milliseconds since the Unix epoch.
/// Batches are ordered by it, not by arrival.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    message: String,
    timestamp: i64,
}

impl LogEvent {
    #[must_use]
    pub fn new(message: impl Into<String>, timestamp: i64) -> Self {
        LogEvent {
            message: message.into(),
            timestamp,
        }
    }

    /// Event stamped with the current wall-clock time.
    #[must_use]
    pub fn now(message: impl Into<String>) -> Self {
        LogEvent::new(message, now_millis())
    }

    /// Builds an event whose message is cut down to `max_event_size` bytes.
    #[must_use]
    pub fn truncated(message: impl Into<String>, timestamp: i64, max_event_size: usize) -> Self {
        let mut message = message.into();
        let original_len = message.len();
        if truncate_on_char_boundary(&mut message, max_event_size) {
            warn!(
                "Log event of {} bytes exceeds the {} byte limit and was truncated",
                original_len, max_event_size
            );
        }
        LogEvent::new(message, timestamp)
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Bytes this event costs against a batch budget.
    #[must_use]
    pub fn size(&self) -> usize {
        self.message.len() + EVENT_OVERHEAD_BYTES
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_size_includes_overhead() {
        let event = LogEvent::new("hello", 1);
        assert_eq!(event.size(), 5 + EVENT_OVERHEAD_BYTES);
        assert_eq!(LogEvent::default().size(), EVENT_OVERHEAD_BYTES);
    }

    #[test]
    fn test_accessors() {
        let event = LogEvent::new("hello", 42);
        assert_eq!(event.message(), "hello");
        assert_eq!(event.timestamp(), 42);
    }

    #[test]
    fn test_now_uses_wall_clock() {
        let before = now_millis();
        let event = LogEvent::now("x");
        assert!(event.timestamp() >= before);
    }

    #[test]
    fn test_truncated_cuts_long_messages() {
        let event = LogEvent::truncated("a".repeat(20), 7, 8);
        assert_eq!(event.message(), "aaaaaaaa");
        assert_eq!(event.timestamp(), 7);
    }

    #[test]
    fn test_truncated_keeps_short_messages() {
        let event = LogEvent::truncated("short", 7, 8);
        assert_eq!(event.message(), "short");
    }

    #[test]
    fn test_serializes_as_message_and_timestamp() {
        let json = serde_json::to_string(&LogEvent::new("a \"quoted\" line", 5)).unwrap();
        assert_eq!(json, r#"{"message":"a \"quoted\" line","timestamp":5}"#);
    }
}
