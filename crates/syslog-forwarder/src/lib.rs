// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Syslog Forwarder
//!
//! Buffers syslog lines into time-ordered, size-bounded batches and ships
//! them to a sink, putting a batch back at the head of the queue when its
//! delivery fails.
//!
//! - [`syslog`]: priority decoding, line parsing and `{{.Field}}` templates
//! - [`logs`]: the event queue, its actor service, batches and shipping
//! - [`config`]: defaults plus `SF_*` environment overrides
//! - [`logger`]: tracing formatter for the forwarder's own diagnostics

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_comparisons)]

/// Configuration from defaults and environment variables
pub mod config;

/// Tracing formatter
pub mod logger;

/// Event buffering, batching and shipping
pub mod logs;

/// Syslog records, priorities and templates
pub mod syslog;

pub mod util;

/// Send attempts per batch before it is put back on the queue.
pub const FLUSH_RETRY_COUNT: u32 = 3;
