// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Size and count limits for log events and batches.
//!
//! The defaults track the CloudWatch Logs `PutLogEvents` intake limits, which
//! the upstream sink enforces:
//! - **Event size**: largest message accepted for one event
//! - **Batch size**: sum of event sizes, each charged a fixed overhead
//! - **Batch count**: number of events per request
//!
//! Whichever batch limit is hit first determines the batch boundary.

/// Maximum size in bytes of a single event's message.
///
/// Longer messages are truncated at ingestion so that any single event can
/// always be shipped on its own.
///
/// # Value: 256KiB (262,144 bytes)
pub const MAX_EVENT_SIZE_BYTES: usize = 256 * 1_024;

/// Upper bound (exclusive) on the summed size of a batch in bytes.
///
/// # Value: 1MiB (1,048,576 bytes)
///
/// # Related
///
/// - See [`EVENT_OVERHEAD_BYTES`] for the per-event charge
pub const MAX_BATCH_SIZE_BYTES: usize = 1_024 * 1_024;

/// Maximum number of events per batch.
pub const MAX_BATCH_EVENTS: usize = 10_000;

/// Fixed cost charged against the batch budget for every event, on top of
/// its message length.
pub const EVENT_OVERHEAD_BYTES: usize = 26;

/// Clamps a requested event count to [`MAX_BATCH_EVENTS`].
#[must_use]
pub fn num_events(requested: usize) -> usize {
    requested.min(MAX_BATCH_EVENTS)
}

/// Batch limits applied by an [`EventQueue`](crate::logs::queue::EventQueue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_event_size_bytes: usize,
    pub max_batch_size_bytes: usize,
    pub max_batch_events: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        BatchLimits {
            max_event_size_bytes: MAX_EVENT_SIZE_BYTES,
            max_batch_size_bytes: MAX_BATCH_SIZE_BYTES,
            max_batch_events: MAX_BATCH_EVENTS,
        }
    }
}

impl BatchLimits {
    #[must_use]
    pub fn num_events(&self, requested: usize) -> usize {
        requested.min(self.max_batch_events)
    }

    /// True when a single maximum-size event fits into an empty batch.
    #[must_use]
    pub fn admits_max_event(&self) -> bool {
        self.max_event_size_bytes
            .checked_add(EVENT_OVERHEAD_BYTES)
            .is_some_and(|size| size < self.max_batch_size_bytes)
    }
}
