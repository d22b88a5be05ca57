// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Periodic batch delivery with put-back on failure.
//!
//! # Architecture
//!
//! ```text
//!   QueueService
//!       │
//!       v
//!   ┌─────────────┐
//!   │  get_batch  │ (time-ordered, bounded)
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │ Sink::send  │ (up to `retry_count` attempts)
//!   └──────┬──────┘
//!          │ failed
//!          v
//!   ┌─────────────┐
//!   │     put     │ (back to the head of the queue)
//!   └─────────────┘
//! ```
//!
//! A requeued batch is retried on the next tick, before anything newer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::logs::queue_service::{QueueError, QueueHandle};
use crate::logs::sink::Sink;
use crate::FLUSH_RETRY_COUNT;

/// Result of a single [`Shipper::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The queue had nothing to ship.
    Empty,
    /// A batch of this many events was delivered.
    Sent(usize),
    /// Delivery failed; this many events went back to the queue head.
    Requeued(usize),
}

pub struct Shipper<S> {
    queue: QueueHandle,
    sink: Arc<S>,
    flush_interval: Duration,
    retry_count: u32,
}

impl<S> Shipper<S>
where
    S: Sink,
{
    #[must_use]
    pub fn new(queue: QueueHandle, sink: Arc<S>, flush_interval: Duration) -> Self {
        Shipper {
            queue,
            sink,
            flush_interval,
            retry_count: FLUSH_RETRY_COUNT,
        }
    }

    /// Number of immediate send attempts per batch before it is requeued.
    #[must_use]
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count.max(1);
        self
    }

    /// Ships one batch.
    pub async fn flush(&self) -> Result<FlushOutcome, QueueError> {
        let batch = self.queue.get_batch().await?;
        if batch.is_empty() {
            return Ok(FlushOutcome::Empty);
        }

        let count = batch.len();
        let mut attempts = 0;
        loop {
            let time = Instant::now();
            attempts += 1;
            match self.sink.send(&batch).await {
                Ok(()) => {
                    debug!(
                        "LOGS | Shipped {} events ({} bytes) in {} ms",
                        count,
                        batch.size(),
                        time.elapsed().as_millis()
                    );
                    return Ok(FlushOutcome::Sent(count));
                }
                Err(e) => {
                    if attempts >= self.retry_count {
                        error!(
                            "LOGS | Failed to ship {} events after {} attempts: {}, requeueing",
                            count, attempts, e
                        );
                        self.queue.put(batch.into_events())?;
                        return Ok(FlushOutcome::Requeued(count));
                    }
                    debug!("LOGS | Attempt {} to ship batch failed: {}", attempts, e);
                }
            }
        }
    }

    /// Flushes batches until the queue is empty or a delivery fails.
    ///
    /// Returns the number of events delivered.
    pub async fn flush_pending(&self) -> Result<usize, QueueError> {
        let mut shipped = 0;
        loop {
            match self.flush().await? {
                FlushOutcome::Sent(count) => shipped += count,
                FlushOutcome::Empty | FlushOutcome::Requeued(_) => return Ok(shipped),
            }
        }
    }

    /// Flushes on every interval tick until `cancel` fires, then makes a
    /// final pass over whatever is still queued.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.flush_pending().await {
                        error!("LOGS | Stopping shipper: {}", e);
                        return;
                    }
                }
                () = cancel.cancelled() => {
                    debug!("LOGS | Received shutdown signal, shipping remaining events");
                    match self.flush_pending().await {
                        Ok(shipped) => debug!("LOGS | Final flush shipped {} events", shipped),
                        Err(e) => error!("LOGS | Final flush failed: {}", e),
                    }
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logs::batch::Batch;
    use crate::logs::constants::BatchLimits;
    use crate::logs::event::LogEvent;
    use crate::logs::queue::EventQueue;
    use crate::logs::queue_service::QueueService;
    use crate::logs::sink::SinkError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fails the first `failures` sends, then records every delivered batch.
    #[derive(Default)]
    struct RecordingSink {
        failures: AtomicUsize,
        attempts: AtomicUsize,
        delivered: Mutex<Vec<Vec<i64>>>,
    }

    impl RecordingSink {
        fn failing(failures: usize) -> Self {
            RecordingSink {
                failures: AtomicUsize::new(failures),
                ..Default::default()
            }
        }

        fn delivered(&self) -> Vec<Vec<i64>> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sink for RecordingSink {
        async fn send(&self, batch: &Batch) -> Result<(), SinkError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(SinkError::Rejected("unavailable".to_string()));
            }
            let timestamps = batch.iter().map(LogEvent::timestamp).collect();
            self.delivered.lock().unwrap().push(timestamps);
            Ok(())
        }
    }

    fn spawn_queue(max_batch_events: usize) -> QueueHandle {
        let limits = BatchLimits {
            max_batch_events,
            ..Default::default()
        };
        let (service, handle) = QueueService::new(EventQueue::new(limits));
        tokio::spawn(service.run());
        handle
    }

    fn events(timestamps: &[i64]) -> Vec<LogEvent> {
        timestamps.iter().map(|ts| LogEvent::new("line", *ts)).collect()
    }

    #[tokio::test]
    async fn test_flush_empty_queue() {
        let queue = spawn_queue(10);
        let sink = Arc::new(RecordingSink::default());
        let shipper = Shipper::new(queue, Arc::clone(&sink), Duration::from_secs(1));

        assert_eq!(shipper.flush().await.unwrap(), FlushOutcome::Empty);
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_flush_sends_time_ordered_batch() {
        let queue = spawn_queue(10);
        queue.add(events(&[3, 1, 2])).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let shipper = Shipper::new(queue.clone(), Arc::clone(&sink), Duration::from_secs(1));

        assert_eq!(shipper.flush().await.unwrap(), FlushOutcome::Sent(3));
        assert_eq!(sink.delivered(), vec![vec![1, 2, 3]]);
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_flush_retries_before_giving_up() {
        let queue = spawn_queue(10);
        queue.add(events(&[1])).unwrap();
        let sink = Arc::new(RecordingSink::failing(2));
        let shipper = Shipper::new(queue, Arc::clone(&sink), Duration::from_secs(1));

        assert_eq!(shipper.flush().await.unwrap(), FlushOutcome::Sent(1));
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_batch_is_requeued_ahead_of_newer_events() {
        let queue = spawn_queue(2);
        queue.add(events(&[10, 20, 30])).unwrap();
        let sink = Arc::new(RecordingSink::failing(1));
        let shipper = Shipper::new(queue.clone(), Arc::clone(&sink), Duration::from_secs(1))
            .with_retry_count(1);

        assert_eq!(shipper.flush().await.unwrap(), FlushOutcome::Requeued(2));
        assert_eq!(queue.len().await.unwrap(), 3);

        queue.add(events(&[40])).unwrap();
        assert_eq!(shipper.flush_pending().await.unwrap(), 4);
        assert_eq!(sink.delivered(), vec![vec![10, 20], vec![30, 40]]);
    }

    #[tokio::test]
    async fn test_flush_pending_stops_on_failure() {
        let queue = spawn_queue(1);
        queue.add(events(&[1, 2, 3])).unwrap();
        let sink = Arc::new(RecordingSink::failing(usize::MAX));
        let shipper = Shipper::new(queue.clone(), Arc::clone(&sink), Duration::from_secs(1));

        assert_eq!(shipper.flush_pending().await.unwrap(), 0);
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(queue.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retry_count_is_at_least_one() {
        let queue = spawn_queue(10);
        queue.add(events(&[1])).unwrap();
        let sink = Arc::new(RecordingSink::failing(1));
        let shipper =
            Shipper::new(queue, Arc::clone(&sink), Duration::from_secs(1)).with_retry_count(0);

        assert_eq!(shipper.flush().await.unwrap(), FlushOutcome::Requeued(1));
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_drains_on_cancel() {
        let queue = spawn_queue(2);
        queue.add(events(&[1, 2, 3, 4, 5])).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let shipper = Shipper::new(queue.clone(), Arc::clone(&sink), Duration::from_secs(3600));

        let cancel = CancellationToken::new();
        cancel.cancel();
        shipper.run(cancel).await;

        assert!(queue.is_empty().await.unwrap());
        let total: usize = sink.delivered().iter().map(Vec::len).sum();
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_flush_reports_closed_queue() {
        let queue = spawn_queue(10);
        queue.shutdown().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let shipper = Shipper::new(queue, Arc::new(RecordingSink::default()), Duration::from_secs(1));

        assert!(matches!(shipper.flush().await, Err(QueueError::Closed)));
    }
}
