// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Events selected for one delivery attempt.
//!
//! A [`Batch`] is produced by [`EventQueue::get_batch`] and owns its events:
//! later queue mutations do not affect it. If delivery fails, hand the events
//! back with [`EventQueue::put`] so they are offered first next time.
//!
//! [`EventQueue::get_batch`]: crate::logs::queue::EventQueue::get_batch
//! [`EventQueue::put`]: crate::logs::queue::EventQueue::put

use std::ops::Index;

use crate::logs::event::LogEvent;

/// Time-ascending events, bounded by the queue's batch limits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    events: Vec<LogEvent>,
    size: usize,
}

impl Batch {
    pub(crate) fn from_events(events: Vec<LogEvent>) -> Self {
        let size = events.iter().map(LogEvent::size).sum();
        Batch { events, size }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of the member events' sizes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEvent> {
        self.events.iter()
    }

    /// Gives the events back, in batch order, e.g. for a put-back.
    #[must_use]
    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }

    /// Serializes the batch as a JSON array:
    ///
    /// ```json
    /// [{"message":"line 1","timestamp":1700000000000},{"message":"line 2","timestamp":1700000000001}]
    /// ```
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.events)
    }

    /// Messages joined by newlines, with a trailing newline when non-empty.
    #[must_use]
    pub fn to_lines(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.size);
        for event in &self.events {
            buffer.extend(event.message().as_bytes());
            buffer.push(b'\n');
        }
        buffer
    }
}

impl Index<usize> for Batch {
    type Output = LogEvent;

    fn index(&self, index: usize) -> &Self::Output {
        &self.events[index]
    }
}

impl IntoIterator for Batch {
    type Item = LogEvent;
    type IntoIter = std::vec::IntoIter<LogEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a LogEvent;
    type IntoIter = std::slice::Iter<'a, LogEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
