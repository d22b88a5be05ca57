// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwarder configuration.
//!
//! Values start from hard-coded defaults and are overridden by `SF_*`
//! environment variables:
//!
//! | Variable                 | Default                                      |
//! |--------------------------|----------------------------------------------|
//! | `SF_HOSTNAME`            | `HOSTNAME`, else `localhost`                 |
//! | `SF_FORMAT`              | `{{.Hostname}} {{.Syslogtag}}: {{.Message}}` |
//! | `SF_PAYLOAD_FORMAT`      | `lines`                                      |
//! | `SF_FLUSH_INTERVAL`      | `5` (seconds)                                |
//! | `SF_FLUSH_RETRY_COUNT`   | `3`                                          |
//! | `SF_MAX_EVENT_SIZE`      | `262144`                                     |
//! | `SF_MAX_BATCH_SIZE`      | `1048576`                                    |
//! | `SF_MAX_BATCH_EVENTS`    | `10000`                                      |
//! | `SF_MAX_QUEUED_EVENTS`   | unset (unbounded)                            |
//! | `SF_LOG_LEVEL`           | `warn`                                       |
//!
//! Unparsable values are reported and replaced by the default. The merged
//! result is then checked by [`Config::validate`].

pub mod log_level;

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::config::log_level::LogLevel;
use crate::logs::constants::{BatchLimits, EVENT_OVERHEAD_BYTES};
use crate::logs::sink::PayloadFormat;
use crate::syslog::template::{Template, TemplateError};
use crate::FLUSH_RETRY_COUNT;

pub const DEFAULT_FORMAT: &str = "{{.Hostname}} {{.Syslogtag}}: {{.Message}}";
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_HOSTNAME: &str = "localhost";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid line format: {0}")]
    Format(#[from] TemplateError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Hostname used for lines that do not carry one
    pub hostname: String,
    /// Template each syslog line is rendered with
    pub format: String,
    pub payload_format: PayloadFormat,
    pub flush_interval: Duration,
    /// Send attempts per batch before it is put back
    pub flush_retry_count: u32,
    pub limits: BatchLimits,
    /// Cap on queued events, `None` for unbounded
    pub max_queued_events: Option<usize>,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            payload_format: PayloadFormat::default(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            flush_retry_count: FLUSH_RETRY_COUNT,
            limits: BatchLimits::default(),
            max_queued_events: None,
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let hostname = value("SF_HOSTNAME")
            .or_else(|| value("HOSTNAME"))
            .unwrap_or(defaults.hostname);
        let format = lookup("SF_FORMAT")
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or(defaults.format);
        let payload_format =
            parse_or(value("SF_PAYLOAD_FORMAT"), "SF_PAYLOAD_FORMAT", defaults.payload_format);
        let flush_interval = Duration::from_secs(parse_or(
            value("SF_FLUSH_INTERVAL"),
            "SF_FLUSH_INTERVAL",
            defaults.flush_interval.as_secs(),
        ));
        let flush_retry_count = parse_or(
            value("SF_FLUSH_RETRY_COUNT"),
            "SF_FLUSH_RETRY_COUNT",
            defaults.flush_retry_count,
        );
        let limits = BatchLimits {
            max_event_size_bytes: parse_or(
                value("SF_MAX_EVENT_SIZE"),
                "SF_MAX_EVENT_SIZE",
                defaults.limits.max_event_size_bytes,
            ),
            max_batch_size_bytes: parse_or(
                value("SF_MAX_BATCH_SIZE"),
                "SF_MAX_BATCH_SIZE",
                defaults.limits.max_batch_size_bytes,
            ),
            max_batch_events: parse_or(
                value("SF_MAX_BATCH_EVENTS"),
                "SF_MAX_BATCH_EVENTS",
                defaults.limits.max_batch_events,
            ),
        };
        let max_queued_events =
            value("SF_MAX_QUEUED_EVENTS").and_then(|raw| match raw.parse::<usize>() {
                Ok(cap) => Some(cap),
                Err(_) => {
                    warn!("Ignoring invalid value {:?} for SF_MAX_QUEUED_EVENTS", raw);
                    None
                }
            });
        let log_level = parse_or(value("SF_LOG_LEVEL"), "SF_LOG_LEVEL", defaults.log_level);

        let config = Self {
            hostname,
            format,
            payload_format,
            flush_interval,
            flush_retry_count,
            limits,
            max_queued_events,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::Invalid("hostname cannot be empty".to_string()));
        }

        if self.flush_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "flush interval must be greater than 0".to_string(),
            ));
        }

        if self.flush_retry_count == 0 {
            return Err(ConfigError::Invalid(
                "flush retry count must be greater than 0".to_string(),
            ));
        }

        if self.limits.max_batch_events == 0 {
            return Err(ConfigError::Invalid(
                "max batch events must be greater than 0".to_string(),
            ));
        }

        if !self.limits.admits_max_event() {
            return Err(ConfigError::Invalid(format!(
                "max event size {} plus {} bytes of overhead must be below max batch size {}",
                self.limits.max_event_size_bytes,
                EVENT_OVERHEAD_BYTES,
                self.limits.max_batch_size_bytes
            )));
        }

        if self.max_queued_events == Some(0) {
            return Err(ConfigError::Invalid(
                "max queued events must be greater than 0 when set".to_string(),
            ));
        }

        self.template()?;
        Ok(())
    }

    /// Parses the configured line format.
    pub fn template(&self) -> Result<Template, ConfigError> {
        Ok(Template::parse(&self.format)?)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
{
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid value {:?} for {}", raw, key);
            default
        }),
    }
}
