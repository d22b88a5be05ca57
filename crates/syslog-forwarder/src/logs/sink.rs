// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery targets for batches.
//!
//! A [`Sink`] either accepts a whole batch or reports an error; the
//! [`Shipper`](crate::logs::shipper::Shipper) puts the batch back on error.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::logs::batch::Batch;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write batch: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("batch rejected by sink: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Sink: Send + Sync {
    async fn send(&self, batch: &Batch) -> Result<(), SinkError>;
}

/// How a [`WriterSink`] lays out a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    /// One JSON array per batch, followed by a newline.
    Json,
    /// One event message per line.
    #[default]
    Lines,
}

impl FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(PayloadFormat::Json),
            "lines" | "text" => Ok(PayloadFormat::Lines),
            _ => Err(format!(
                "Invalid payload format: '{s}'. Valid formats are: json, lines"
            )),
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadFormat::Json => f.write_str("json"),
            PayloadFormat::Lines => f.write_str("lines"),
        }
    }
}

impl PayloadFormat {
    pub fn encode(self, batch: &Batch) -> Result<Vec<u8>, SinkError> {
        match self {
            PayloadFormat::Json => {
                let mut payload = batch.to_json()?;
                payload.push(b'\n');
                Ok(payload)
            }
            PayloadFormat::Lines => Ok(batch.to_lines()),
        }
    }
}

/// Writes every batch to an async writer such as stdout.
pub struct WriterSink<W> {
    writer: Mutex<W>,
    format: PayloadFormat,
}

impl<W> WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W, format: PayloadFormat) -> Self {
        WriterSink {
            writer: Mutex::new(writer),
            format,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> Sink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, batch: &Batch) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        let payload = self.format.encode(batch)?;
        let mut writer = self.writer.lock().await;
        writer.write_all(&payload).await?;
        writer.flush().await?;
        Ok(())
    }
}
