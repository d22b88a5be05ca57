// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Shortens `text` to at most `max_len` bytes without splitting a UTF-8
/// character. Returns `true` if anything was removed.
pub fn truncate_on_char_boundary(text: &mut String, max_len: usize) -> bool {
    if text.len() <= max_len {
        return false;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    true
}

/// Milliseconds since the Unix epoch for the current wall clock.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
