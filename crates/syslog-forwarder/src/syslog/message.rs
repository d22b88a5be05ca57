// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! A single syslog record and its rendering.
//!
//! Raw lines are accepted in either of the two common wire shapes:
//!
//! ```text
//! <34>Oct 11 22:14:15 mymachine su: 'su root' failed           (RFC 3164)
//! <165>1 2003-10-11T22:14:15.003Z host app 42 ID47 - message   (RFC 5424)
//! ```
//!
//! Parsing never fails. A line without a usable `<PRI>` header is kept whole
//! as the message body and tagged `USER.NOTICE`, so nothing read from the
//! host is lost before it reaches the queue.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::syslog::template::{RenderError, Template, TemplateError, TemplateFields};
use crate::syslog::{Facility, Priority, Severity, MAX_PRIORITY};
use crate::util::truncate_on_char_boundary;

/// Longest message body kept from a syslog line, in bytes.
pub const MAX_MESSAGE_LEN: usize = 2048;

const NIL_VALUE: &str = "-";
const BOM: char = '\u{feff}';

/// Either half of a one-shot `render` call can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderLineError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogMessage {
    pub facility: Facility,
    pub severity: Severity,
    pub message: String,
    pub tag: String,
    pub hostname: String,
    pub timestamp: DateTime<Utc>,
}

impl SyslogMessage {
    #[must_use]
    pub fn new(
        priority: Priority,
        message: impl Into<String>,
        tag: impl Into<String>,
        hostname: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let (facility, severity) = priority.decode();
        let mut message = message.into();
        truncate_on_char_boundary(&mut message, MAX_MESSAGE_LEN);
        SyslogMessage {
            facility,
            severity,
            message,
            tag: tag.into(),
            hostname: hostname.into(),
            timestamp,
        }
    }

    /// Parses one raw syslog line.
    ///
    /// `received_at` stands in for the timestamp when the line carries none
    /// that can be trusted (RFC 3164 headers have no year or zone), and
    /// `default_hostname` fills in a missing hostname.
    #[must_use]
    pub fn parse(raw: &str, received_at: DateTime<Utc>, default_hostname: &str) -> Self {
        let line = raw.trim_end_matches(['\r', '\n']);
        let Some((priority, rest)) = split_priority(line) else {
            return SyslogMessage::new(Priority::DEFAULT, line, "", default_hostname, received_at);
        };

        let header = match rest.strip_prefix("1 ") {
            Some(rfc5424) => parse_rfc5424(rfc5424),
            None => parse_rfc3164(rest),
        };

        SyslogMessage::new(
            priority,
            header.message,
            header.tag,
            header.hostname.unwrap_or(default_hostname),
            header.timestamp.unwrap_or(received_at),
        )
    }

    /// Re-packs facility and severity, when they still fit a priority byte.
    #[must_use]
    pub fn priority(&self) -> Option<Priority> {
        Priority::new(self.facility, self.severity)
    }

    /// Renders the message through a template that is parsed on every call.
    ///
    /// Prefer [`SyslogMessage::render_with`] on hot paths.
    pub fn render(&self, format: &str) -> Result<String, RenderLineError> {
        let template = Template::parse(format)?;
        Ok(template.render(self)?)
    }

    pub fn render_with(&self, template: &Template) -> Result<String, RenderError> {
        template.render(self)
    }
}

impl TemplateFields for SyslogMessage {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "Facility" => Some(Cow::Borrowed(self.facility.name())),
            "Severity" => Some(Cow::Borrowed(self.severity.name())),
            "Message" => Some(Cow::Borrowed(self.message.as_str())),
            "Syslogtag" => Some(Cow::Borrowed(self.tag.as_str())),
            "Hostname" => Some(Cow::Borrowed(self.hostname.as_str())),
            _ => None,
        }
    }
}

struct Header<'a> {
    hostname: Option<&'a str>,
    tag: String,
    message: &'a str,
    timestamp: Option<DateTime<Utc>>,
}

fn split_priority(line: &str) -> Option<(Priority, &str)> {
    let rest = line.strip_prefix('<')?;
    let end = rest.find('>')?;
    let digits = &rest[..end];
    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u8 = digits.parse().ok()?;
    if value > MAX_PRIORITY {
        return None;
    }
    Some((Priority(value), &rest[end + 1..]))
}

fn non_nil(value: &str) -> Option<&str> {
    (!value.is_empty() && value != NIL_VALUE).then_some(value)
}

// TIMESTAMP SP HOSTNAME SP APP-NAME SP PROCID SP MSGID SP STRUCTURED-DATA [SP MSG]
fn parse_rfc5424(text: &str) -> Header<'_> {
    let mut parts = text.splitn(6, ' ');
    let timestamp = parts
        .next()
        .and_then(non_nil)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));
    let hostname = parts.next().and_then(non_nil);
    let app_name = parts.next().and_then(non_nil);
    let proc_id = parts.next().and_then(non_nil);
    let _msg_id = parts.next();
    let message = parts.next().map(skip_structured_data).unwrap_or_default();

    let tag = match (app_name, proc_id) {
        (Some(app), Some(pid)) => format!("{app}[{pid}]"),
        (Some(app), None) => app.to_string(),
        (None, _) => String::new(),
    };

    Header {
        hostname,
        tag,
        message: message.trim_start_matches(BOM),
        timestamp,
    }
}

fn skip_structured_data(text: &str) -> &str {
    if let Some(rest) = text.strip_prefix(NIL_VALUE) {
        return rest.strip_prefix(' ').unwrap_or(rest);
    }
    if !text.starts_with('[') {
        return text;
    }

    let mut depth = 0usize;
    let mut escaped = false;
    let mut in_value = false;
    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_value => escaped = true,
            '"' if depth > 0 => in_value = !in_value,
            '[' if !in_value => depth += 1,
            ']' if !in_value => {
                depth = depth.saturating_sub(1);
                let next = text[idx + 1..].chars().next();
                if depth == 0 && next != Some('[') {
                    let rest = &text[idx + 1..];
                    return rest.strip_prefix(' ').unwrap_or(rest);
                }
            }
            _ => {}
        }
    }
    // Unterminated structured data, keep everything
    text
}

// Mmm dd hh:mm:ss SP HOSTNAME SP TAG: MSG
fn parse_rfc3164(text: &str) -> Header<'_> {
    let (hostname, body) = match text.get(..16) {
        Some(stamp) if looks_like_bsd_timestamp(stamp) => {
            let after = &text[16..];
            match after.split_once(' ') {
                Some((host, body)) => (non_nil(host), body),
                None => (None, after),
            }
        }
        _ => (None, text),
    };

    let (tag, message) = match body.split_once(' ') {
        Some((token, message)) if token.len() > 1 && token.ends_with(':') => {
            (token.trim_end_matches(':').to_string(), message)
        }
        _ => (String::new(), body),
    };

    Header {
        hostname,
        tag,
        message,
        timestamp: None,
    }
}

fn looks_like_bsd_timestamp(stamp: &str) -> bool {
    let bytes = stamp.as_bytes();
    bytes.len() == 16
        && bytes[..3].iter().all(u8::is_ascii_alphabetic)
        && bytes[3] == b' '
        && bytes[6] == b' '
        && bytes[9] == b':'
        && bytes[12] == b':'
        && bytes[15] == b' '
}
