// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log buffering and shipping.
//!
//! ```text
//!                     ┌──────────────┐
//!                     │  LogsAgent   │  (parse, render, truncate)
//!                     └──────┬───────┘
//!                            │ add
//!                            v
//!                  ┌─────────────────┐
//!                  │  QueueService   │  (owns the EventQueue)
//!                  └─────────┬───────┘
//!                            │ get_batch / put
//!                            v
//!                     ┌──────────────┐
//!                     │   Shipper    │  (interval, retries)
//!                     └──────┬───────┘
//!                            │
//!                            v
//!                     ┌──────────────┐
//!                     │     Sink     │
//!                     └──────────────┘
//! ```
//!
//! The queue never drops an event on `add` or `put` unless a queue cap is
//! configured. Only `get_batch` removes events, and a failed delivery hands
//! them back with `put` so they are retried before anything newer.
//!
//! # Components
//!
//! - **[`agent`]**: turns raw lines into [`event::LogEvent`]s
//! - **[`queue`]**: the buffer and the batch selection
//! - **[`queue_service`]**: actor that serializes access to the queue
//! - **[`batch`]**: one delivery attempt's worth of events
//! - **[`shipper`]**: periodic delivery with put-back
//! - **[`sink`]**: delivery targets
//! - **[`constants`]**: CloudWatch Logs payload limits

pub mod agent;
pub mod batch;
pub mod constants;
pub mod event;
pub mod queue;
pub mod queue_service;
pub mod shipper;
pub mod sink;
