// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ingestion agent turning raw syslog lines into queued log events.
//!
//! # Architecture
//!
//! ```text
//!   Line readers
//!       │
//!       v
//!   ┌─────────────┐
//!   │   Channel   │ (mpsc, bounded)
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │  LogsAgent  │ (parse, render, truncate)
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │ QueueHandle │ (add)
//!   └─────────────┘
//! ```
//!
//! On cancellation the agent drains whatever is still in the channel before
//! it stops, so lines read before shutdown still reach the queue.

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::{self, error::TryRecvError, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::{Config, ConfigError};
use crate::logs::event::LogEvent;
use crate::logs::queue_service::QueueHandle;
use crate::syslog::message::SyslogMessage;
use crate::syslog::template::Template;

const CHANNEL_CAPACITY: usize = 1000;

/// A line as read from a source, stamped with the time it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub line: String,
    pub received_at: DateTime<Utc>,
}

impl RawLine {
    #[must_use]
    pub fn new(line: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        RawLine {
            line: line.into(),
            received_at,
        }
    }

    #[must_use]
    pub fn now(line: impl Into<String>) -> Self {
        RawLine::new(line, Utc::now())
    }
}

#[allow(clippy::module_name_repetitions)]
pub struct LogsAgent {
    rx: mpsc::Receiver<RawLine>,
    template: Template,
    hostname: String,
    max_event_size: usize,
    queue: QueueHandle,
    cancel_token: CancellationToken,
}

impl LogsAgent {
    /// Creates the agent and the sender that feeds it.
    ///
    /// The channel holds up to 1,000 lines; senders wait when it is full.
    pub fn new(config: &Config, queue: QueueHandle) -> Result<(Self, Sender<RawLine>), ConfigError> {
        let template = config.template()?;
        let (tx, rx) = mpsc::channel::<RawLine>(CHANNEL_CAPACITY);

        let agent = Self {
            rx,
            template,
            hostname: config.hostname.clone(),
            max_event_size: config.limits.max_event_size_bytes,
            queue,
            cancel_token: CancellationToken::new(),
        };

        Ok((agent, tx))
    }

    /// Processes lines until cancelled or every sender is gone.
    pub async fn spin(&mut self) {
        loop {
            tokio::select! {
                line = self.rx.recv() => match line {
                    Some(line) => self.process(line),
                    None => {
                        debug!("LOGS_AGENT | All senders closed, stopping");
                        break;
                    }
                },
                () = self.cancel_token.cancelled() => {
                    debug!("LOGS_AGENT | Received shutdown signal, draining remaining lines");
                    self.drain();
                    break;
                }
            }
        }
    }

    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(line) => self.process(line),
                Err(TryRecvError::Empty) => {
                    debug!("LOGS_AGENT | Channel empty, finished draining");
                    break;
                }
                Err(TryRecvError::Disconnected) => {
                    debug!("LOGS_AGENT | Channel disconnected, finished draining");
                    break;
                }
            }
        }
    }

    fn process(&self, raw: RawLine) {
        if let Some(event) = self.to_event(&raw) {
            if let Err(e) = self.queue.add(vec![event]) {
                error!("LOGS_AGENT | Failed to queue log event: {}", e);
            }
        }
    }

    /// Parses and renders one line. Returns `None` when rendering fails.
    fn to_event(&self, raw: &RawLine) -> Option<LogEvent> {
        let message = SyslogMessage::parse(&raw.line, raw.received_at, &self.hostname);
        match message.render_with(&self.template) {
            Ok(rendered) => Some(LogEvent::truncated(
                rendered,
                message.timestamp.timestamp_millis(),
                self.max_event_size,
            )),
            Err(e) => {
                error!("LOGS_AGENT | Dropping line that could not be rendered: {}", e);
                None
            }
        }
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

/// Feeds newline-delimited lines from `reader` to an agent until end of
/// input or until the agent goes away. Blank lines are skipped.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD; the line is
/// still forwarded.
///
/// Returns the number of lines handed to the agent.
pub async fn read_lines<R>(mut reader: R, tx: Sender<RawLine>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut count = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let bytes = buf
            .strip_suffix(b"\n")
            .map_or(buf.as_slice(), |b| b.strip_suffix(b"\r").unwrap_or(b));
        let line = match std::str::from_utf8(bytes) {
            Ok(line) => line.to_string(),
            Err(_) => {
                warn!("LOGS_AGENT | Input line is not valid UTF-8, replacing invalid bytes");
                String::from_utf8_lossy(bytes).into_owned()
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if tx.send(RawLine::now(line)).await.is_err() {
            debug!("LOGS_AGENT | Agent stopped, no longer reading input");
            break;
        }
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logs::constants::BatchLimits;
    use crate::logs::queue::EventQueue;
    use crate::logs::queue_service::QueueService;
    use chrono::TimeZone;
    use std::time::Duration;
    use tokio::time::timeout;

    fn spawn_queue() -> QueueHandle {
        let (service, handle) = QueueService::new(EventQueue::default());
        tokio::spawn(service.run());
        handle
    }

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn test_config() -> Config {
        Config {
            hostname: "fallback-host".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_new_rejects_malformed_template() {
        let config = Config {
            format: "{{.Message".to_string(),
            ..Default::default()
        };
        assert!(LogsAgent::new(&config, spawn_queue()).is_err());
    }

    #[tokio::test]
    async fn test_line_is_rendered_and_queued() {
        let queue = spawn_queue();
        let (agent, _tx) = LogsAgent::new(&test_config(), queue.clone()).unwrap();

        agent.process(RawLine::new("<13>plain text", received_at()));

        let batch = queue.get_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].message(), "fallback-host : plain text");
        assert_eq!(batch[0].timestamp(), received_at().timestamp_millis());
    }

    #[tokio::test]
    async fn test_rfc5424_fields_reach_the_event() {
        let queue = spawn_queue();
        let (agent, _tx) = LogsAgent::new(&test_config(), queue.clone()).unwrap();

        agent.process(RawLine::new(
            "<165>1 2003-10-11T22:14:15.003Z mymachine evntslog - ID47 - An application event",
            received_at(),
        ));

        let batch = queue.get_batch().await.unwrap();
        assert_eq!(batch[0].message(), "mymachine evntslog: An application event");
        assert_eq!(batch[0].timestamp(), 1_065_910_455_003);
    }

    #[tokio::test]
    async fn test_unknown_template_field_drops_line() {
        let queue = spawn_queue();
        let config = Config {
            format: "{{.Program}}".to_string(),
            ..Default::default()
        };
        let (agent, _tx) = LogsAgent::new(&config, queue.clone()).unwrap();

        agent.process(RawLine::now("<13>hello"));

        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_long_rendering_is_truncated_to_max_event_size() {
        let queue = spawn_queue();
        let config = Config {
            format: "{{.Message}}{{.Message}}".to_string(),
            limits: BatchLimits {
                max_event_size_bytes: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        let (agent, _tx) = LogsAgent::new(&config, queue.clone()).unwrap();

        agent.process(RawLine::now("<13>abcdefgh"));

        let batch = queue.get_batch().await.unwrap();
        assert_eq!(batch[0].message(), "abcdefghab");
    }

    #[tokio::test]
    async fn test_spin_stops_when_senders_close() {
        let queue = spawn_queue();
        let (mut agent, tx) = LogsAgent::new(&test_config(), queue.clone()).unwrap();

        tx.send(RawLine::now("<13>one")).await.unwrap();
        tx.send(RawLine::now("<13>two")).await.unwrap();
        drop(tx);

        timeout(Duration::from_secs(1), agent.spin()).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_spin_drains_on_cancel() {
        let queue = spawn_queue();
        let (mut agent, tx) = LogsAgent::new(&test_config(), queue.clone()).unwrap();

        for i in 0..20 {
            tx.send(RawLine::now(format!("<13>line {i}"))).await.unwrap();
        }
        agent.cancel_token().cancel();

        // The sender is still alive; spin must not wait for it
        timeout(Duration::from_secs(1), agent.spin()).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_read_lines_skips_blank_lines() {
        let (tx, mut rx) = mpsc::channel(16);
        let input: &[u8] = b"<13>first\n\n   \n<13>second\r\n<13>third";

        let count = read_lines(input, tx).await.unwrap();

        assert_eq!(count, 3);
        let mut seen = Vec::new();
        while let Some(raw) = rx.recv().await {
            seen.push(raw.line);
        }
        assert_eq!(seen, vec!["<13>first", "<13>second", "<13>third"]);
    }

    #[tokio::test]
    async fn test_read_lines_stops_when_agent_is_gone() {
        let (tx, rx) = mpsc::channel(16);
        drop(rx);
        let input: &[u8] = b"<13>first\n<13>second\n";

        assert_eq!(read_lines(input, tx).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_lines_keeps_going_after_invalid_utf8() {
        let queue = spawn_queue();
        let config = Config {
            format: "{{.Message}}".to_string(),
            ..Default::default()
        };
        let (mut agent, tx) = LogsAgent::new(&config, queue.clone()).unwrap();
        let input: &[u8] =
            b"<13>app: before\n<13>app: bad \xff byte\n<13>app: after one\n<13>app: after two\n";

        assert_eq!(read_lines(input, tx).await.unwrap(), 4);
        timeout(Duration::from_secs(1), agent.spin()).await.unwrap();

        let batch = queue.get_batch().await.unwrap();
        let messages: Vec<&str> = batch.iter().map(LogEvent::message).collect();
        assert_eq!(
            messages,
            vec!["before", "bad \u{fffd} byte", "after one", "after two"]
        );
    }

    #[test]
    fn test_raw_line_new() {
        let line = RawLine::new("<13>x", received_at());
        assert_eq!(line.line, "<13>x");
        assert_eq!(line.received_at, received_at());
    }
}
