// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Actor-based queue service for concurrent access.
//!
//! The [`EventQueue`] is owned by a single task. Producers and the shipping
//! loop talk to it through cloneable [`QueueHandle`]s, so `add`, `put` and
//! `get_batch` are applied one at a time in the order they were sent:
//!
//! ```text
//!    ┌──────────────┐
//!    │   Handles    │ (ingestors + shipper)
//!    └──────┬───────┘
//!           │ Commands via channel
//!           v
//!    ┌──────────────┐
//!    │ QueueService │ (single task)
//!    └──────┬───────┘
//!           │ Owns queue
//!           v
//!    ┌──────────────┐
//!    │  EventQueue  │
//!    └──────────────┘
//! ```
//!
//! Because every mutation goes through one task, an event handed out by
//! `get_batch` can never be handed out again unless it is `put` back.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::logs::batch::Batch;
use crate::logs::event::LogEvent;
use crate::logs::queue::EventQueue;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue service is not running")]
    Closed,

    #[error("queue service dropped the response")]
    ResponseDropped,
}

impl<T> From<mpsc::error::SendError<T>> for QueueError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        QueueError::Closed
    }
}

impl From<oneshot::error::RecvError> for QueueError {
    fn from(_: oneshot::error::RecvError) -> Self {
        QueueError::ResponseDropped
    }
}

#[derive(Debug)]
pub enum QueueCommand {
    Add(Vec<LogEvent>),
    Put(Vec<LogEvent>),
    GetBatch(oneshot::Sender<Batch>),
    Len(oneshot::Sender<usize>),
    Shutdown,
}

#[derive(Clone, Debug)]
pub struct QueueHandle {
    tx: mpsc::UnboundedSender<QueueCommand>,
}

impl QueueHandle {
    /// Appends events to the tail of the queue. Does not wait for the service.
    pub fn add(&self, events: Vec<LogEvent>) -> Result<(), QueueError> {
        Ok(self.tx.send(QueueCommand::Add(events))?)
    }

    /// Returns undelivered events to the head of the queue.
    pub fn put(&self, events: Vec<LogEvent>) -> Result<(), QueueError> {
        Ok(self.tx.send(QueueCommand::Put(events))?)
    }

    pub async fn get_batch(&self) -> Result<Batch, QueueError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx.send(QueueCommand::GetBatch(response_tx))?;
        Ok(response_rx.await?)
    }

    pub async fn len(&self) -> Result<usize, QueueError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx.send(QueueCommand::Len(response_tx))?;
        Ok(response_rx.await?)
    }

    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }

    pub fn shutdown(&self) -> Result<(), QueueError> {
        Ok(self.tx.send(QueueCommand::Shutdown)?)
    }
}

pub struct QueueService {
    queue: EventQueue,
    rx: mpsc::UnboundedReceiver<QueueCommand>,
}

impl QueueService {
    #[must_use]
    pub fn new(queue: EventQueue) -> (Self, QueueHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (QueueService { queue, rx }, QueueHandle { tx })
    }

    pub async fn run(mut self) {
        debug!("Event queue service started");

        while let Some(command) = self.rx.recv().await {
            match command {
                QueueCommand::Add(events) => self.queue.add_batch(events),
                QueueCommand::Put(events) => {
                    debug!("Requeueing {} undelivered log events", events.len());
                    self.queue.put(events);
                }
                QueueCommand::GetBatch(response_tx) => {
                    let batch = self.queue.get_batch();
                    if let Err(batch) = response_tx.send(batch) {
                        // Nobody will ship these; keep them at the head
                        error!("Failed to send batch response - receiver dropped, requeueing");
                        self.queue.put(batch.into_events());
                    }
                }
                QueueCommand::Len(response_tx) => {
                    if response_tx.send(self.queue.len()).is_err() {
                        error!("Failed to send queue length response - receiver dropped");
                    }
                }
                QueueCommand::Shutdown => {
                    debug!(
                        "Event queue service shutting down with {} pending events",
                        self.queue.len()
                    );
                    break;
                }
            }
        }
    }
}
