// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! BSD syslog message model.
//!
//! A syslog priority packs a facility and a severity into one integer:
//!
//! ```text
//! priority = facility * 8 + severity
//! ```
//!
//! Facility and severity codes follow `/usr/include/sys/syslog.h`. Codes that
//! fall outside the known tables still decode arithmetically; they only show
//! up as `UNKNOWN` when stringified.
//!
//! - **[`message`]**: parsed syslog line and rendering
//! - **[`template`]**: `{{.Field}}` line templates

pub mod message;
pub mod template;

use std::fmt;

/// Name returned for codes missing from the facility or severity tables.
pub const UNKNOWN: &str = "UNKNOWN";

/// Largest priority a well-formed syslog header may carry (`local7.debug`).
pub const MAX_PRIORITY: u8 = 191;

const SEVERITY_NAMES: [&str; 8] = [
    "EMERG", "ALERT", "CRIT", "ERR", "WARNING", "NOTICE", "INFO", "DEBUG",
];

const FACILITY_NAMES: [&str; 24] = [
    "KERN", "USER", "MAIL", "DAEMON", "AUTH", "SYSLOG", "LPR", "NEWS", "UUCP", "CLOCK",
    "AUTHPRIV", "FTP", "NTP", "LOGAUDIT", "LOGALERT", "CRON", "LOCAL0", "LOCAL1", "LOCAL2",
    "LOCAL3", "LOCAL4", "LOCAL5", "LOCAL6", "LOCAL7",
];

/// Syslog severity code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Severity(pub u8);

impl Severity {
    pub const EMERG: Severity = Severity(0);
    pub const ALERT: Severity = Severity(1);
    pub const CRIT: Severity = Severity(2);
    pub const ERR: Severity = Severity(3);
    pub const WARNING: Severity = Severity(4);
    pub const NOTICE: Severity = Severity(5);
    pub const INFO: Severity = Severity(6);
    pub const DEBUG: Severity = Severity(7);

    /// Canonical uppercase name, or [`UNKNOWN`] for codes above 7.
    #[must_use]
    pub fn name(self) -> &'static str {
        SEVERITY_NAMES
            .get(usize::from(self.0))
            .copied()
            .unwrap_or(UNKNOWN)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Syslog facility code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Facility(pub u8);

impl Facility {
    pub const KERN: Facility = Facility(0);
    pub const USER: Facility = Facility(1);
    pub const MAIL: Facility = Facility(2);
    pub const DAEMON: Facility = Facility(3);
    pub const AUTH: Facility = Facility(4);
    pub const SYSLOG: Facility = Facility(5);
    pub const LPR: Facility = Facility(6);
    pub const NEWS: Facility = Facility(7);
    pub const UUCP: Facility = Facility(8);
    pub const CLOCK: Facility = Facility(9);
    pub const AUTHPRIV: Facility = Facility(10);
    pub const FTP: Facility = Facility(11);
    pub const NTP: Facility = Facility(12);
    pub const LOGAUDIT: Facility = Facility(13);
    pub const LOGALERT: Facility = Facility(14);
    pub const CRON: Facility = Facility(15);
    pub const LOCAL0: Facility = Facility(16);
    pub const LOCAL1: Facility = Facility(17);
    pub const LOCAL2: Facility = Facility(18);
    pub const LOCAL3: Facility = Facility(19);
    pub const LOCAL4: Facility = Facility(20);
    pub const LOCAL5: Facility = Facility(21);
    pub const LOCAL6: Facility = Facility(22);
    pub const LOCAL7: Facility = Facility(23);

    /// Canonical uppercase name, or [`UNKNOWN`] for codes above 23.
    #[must_use]
    pub fn name(self) -> &'static str {
        FACILITY_NAMES
            .get(usize::from(self.0))
            .copied()
            .unwrap_or(UNKNOWN)
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Packed facility/severity value as found in a `<PRI>` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Priority(pub u8);

impl Priority {
    /// `user.notice`, assigned to lines that carry no priority header.
    pub const DEFAULT: Priority = Priority(13);

    /// Packs a facility and severity. Returns `None` when the result does not
    /// fit a priority byte or the severity is out of range.
    #[must_use]
    pub fn new(facility: Facility, severity: Severity) -> Option<Self> {
        if severity.0 > 7 {
            return None;
        }
        facility
            .0
            .checked_mul(8)
            .and_then(|base| base.checked_add(severity.0))
            .map(Priority)
    }

    /// Splits the priority into `(facility, severity)`.
    #[must_use]
    pub fn decode(self) -> (Facility, Severity) {
        (Facility(self.0 / 8), Severity(self.0 % 8))
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        Priority(value)
    }
}
