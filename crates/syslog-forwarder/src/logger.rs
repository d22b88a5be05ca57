// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Tracing formatter for the forwarder's own diagnostics.
//!
//! Diagnostics go to stderr while shipped batches may go to stdout, so every
//! line carries a fixed prefix that makes it easy to tell the two apart:
//!
//! ```text
//! SYSLOG_FORWARDER | LEVEL | [span_name{span_fields}:] message {event_fields}
//! ```
//!
//! ```text
//! SYSLOG_FORWARDER | WARN | Event queue full (100000 items), dropping oldest log event
//! SYSLOG_FORWARDER | DEBUG | LOGS | Shipped 12 events (1830 bytes) in 0 ms
//! ```

use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;

pub const PREFIX: &str = "SYSLOG_FORWARDER";

#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(&mut writer, "{PREFIX} | {} | ", metadata.level())?;

        // Root span first
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::{info_span, warn};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(Formatter)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buf.contents()
    }

    #[test]
    fn test_prefix_and_level() {
        let output = capture(|| warn!("queue is full"));
        assert_eq!(output, "SYSLOG_FORWARDER | WARN | queue is full\n");
    }

    #[test]
    fn test_event_fields_follow_message() {
        let output = capture(|| warn!(dropped = 3, "queue is full"));
        assert_eq!(output, "SYSLOG_FORWARDER | WARN | queue is full dropped=3\n");
    }

    #[test]
    fn test_span_context() {
        let output = capture(|| {
            let span = info_span!("shipper", attempt = 2);
            let _guard = span.enter();
            warn!("send failed");
        });
        assert_eq!(
            output,
            "SYSLOG_FORWARDER | WARN | shipper{attempt=2}: send failed\n"
        );
    }
}
