// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Pending-event buffer and batch extraction.
//!
//! # Batching Strategy
//!
//! [`EventQueue::get_batch`] looks at the buffer in timestamp order (stable on
//! ties) and takes the longest prefix that satisfies both limits:
//! 1. **Count limit**: at most `max_batch_events` events
//! 2. **Size limit**: summed [`LogEvent::size`] strictly below `max_batch_size_bytes`
//!
//! Selection stops at the first event that would break either limit. Selected
//! events leave the buffer; the rest keep their insertion order.
//!
//! # Put-back
//!
//! A batch that could not be delivered goes back to the head of the buffer
//! through [`EventQueue::put`], ahead of anything added since.
//!
//! # Memory Management
//!
//! The buffer is unbounded unless [`EventQueue::with_max_queued_events`] is
//! used. With a cap, `add` evicts the oldest queued event and logs a warning.
//! `put` never evicts.

use std::collections::VecDeque;
use tracing::warn;

use crate::logs::batch::Batch;
use crate::logs::constants::BatchLimits;
use crate::logs::event::LogEvent;

#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    /// Pending events in insertion order.
    pub(crate) events: VecDeque<LogEvent>,

    pub(crate) limits: BatchLimits,

    /// Eviction threshold for `add`, `None` for unbounded.
    pub(crate) max_queued_events: Option<usize>,
}

impl EventQueue {
    #[must_use]
    pub fn new(limits: BatchLimits) -> Self {
        EventQueue {
            events: VecDeque::new(),
            limits,
            max_queued_events: None,
        }
    }

    /// Caps the buffer at `max` events; `add` drops the oldest beyond that.
    #[must_use]
    pub fn with_max_queued_events(mut self, max: usize) -> Self {
        self.max_queued_events = Some(max);
        self
    }

    /// Appends an event to the tail of the buffer.
    pub fn add(&mut self, event: LogEvent) {
        if let Some(max) = self.max_queued_events {
            while self.events.len() >= max.max(1) {
                self.events.pop_front();
                warn!(
                    "Event queue full ({} items), dropping oldest log event",
                    max
                );
            }
        }
        self.events.push_back(event);
    }

    pub fn add_batch(&mut self, events: Vec<LogEvent>) {
        for event in events {
            self.add(event);
        }
    }

    /// Prepends `events` to the head of the buffer, keeping their order.
    pub fn put(&mut self, events: Vec<LogEvent>) {
        self.events.reserve(events.len());
        for event in events.into_iter().rev() {
            self.events.push_front(event);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter()
    }

    #[must_use]
    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// Clamps `requested` to this queue's per-batch event limit.
    #[must_use]
    pub fn num_events(&self, requested: usize) -> usize {
        self.limits.num_events(requested)
    }

    /// Removes and returns the next time-ordered batch.
    ///
    /// Returns an empty batch if the buffer is empty, or if the oldest event
    /// alone exceeds the batch size limit (it stays queued).
    pub fn get_batch(&mut self) -> Batch {
        if self.events.is_empty() {
            return Batch::default();
        }

        // Stable sort of positions keeps insertion order among equal timestamps
        let mut order: Vec<usize> = (0..self.events.len()).collect();
        order.sort_by_key(|&idx| self.events[idx].timestamp());

        let mut selected = 0;
        let mut batch_size = 0;
        for &idx in order.iter().take(self.limits.max_batch_events) {
            let event_size = self.events[idx].size();
            if batch_size + event_size >= self.limits.max_batch_size_bytes {
                break;
            }
            batch_size += event_size;
            selected += 1;
        }

        if selected == 0 {
            if let Some(&head) = order.first() {
                warn!(
                    "Log event of {} bytes does not fit the {} byte batch limit, keeping it queued",
                    self.events[head].size(),
                    self.limits.max_batch_size_bytes
                );
            }
            return Batch::default();
        }

        let mut slots: Vec<Option<LogEvent>> = self.events.drain(..).map(Some).collect();
        let batch: Vec<LogEvent> = order[..selected]
            .iter()
            .filter_map(|&idx| slots[idx].take())
            .collect();
        self.events.extend(slots.into_iter().flatten());

        Batch::from_events(batch)
    }
}
