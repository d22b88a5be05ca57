// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process, sync::Arc};

use tokio::io::{stdin, stdout, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use syslog_forwarder::{
    config::{log_level::LogLevel, Config},
    logger::Formatter,
    logs::{
        agent::{read_lines, LogsAgent},
        queue::EventQueue,
        queue_service::QueueService,
        shipper::Shipper,
        sink::WriterSink,
    },
};

#[tokio::main]
pub async fn main() {
    // The subscriber must exist before the config is read so config errors are visible
    let log_level = env::var("SF_LOG_LEVEL")
        .ok()
        .and_then(|val| val.parse::<LogLevel>().ok())
        .unwrap_or_default();

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::new(log_level.directive()))
        .with_writer(std::io::stderr)
        .event_format(Formatter)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {e}");
    }

    debug!("Logging subsystem enabled");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };
    debug!("Loaded configuration: {:?}", config);

    let mut queue = EventQueue::new(config.limits);
    if let Some(max) = config.max_queued_events {
        queue = queue.with_max_queued_events(max);
    }
    let (queue_service, queue_handle) = QueueService::new(queue);
    let queue_task = tokio::spawn(queue_service.run());

    let (mut agent, line_tx) = match LogsAgent::new(&config, queue_handle.clone()) {
        Ok(agent) => agent,
        Err(e) => {
            error!("Error creating logs agent: {}", e);
            process::exit(1);
        }
    };
    let agent_cancel = agent.cancel_token();
    let agent_task = tokio::spawn(async move { agent.spin().await });

    let sink = Arc::new(WriterSink::new(stdout(), config.payload_format));
    let shipper = Shipper::new(queue_handle.clone(), sink, config.flush_interval)
        .with_retry_count(config.flush_retry_count);
    let shipper_cancel = CancellationToken::new();
    let shipper_task = {
        let cancel = shipper_cancel.clone();
        tokio::spawn(async move { shipper.run(cancel).await })
    };

    info!(
        "Forwarding syslog lines from stdin, flushing every {}s",
        config.flush_interval.as_secs()
    );

    let mut reader_task = tokio::spawn(read_lines(BufReader::new(stdin()), line_tx));
    let interrupted = tokio::select! {
        result = &mut reader_task => {
            match result {
                Ok(Ok(count)) => info!("Reached end of input after {} lines", count),
                Ok(Err(e)) => error!("Failed to read input: {}", e),
                Err(e) => error!("Input reader task failed: {}", e),
            }
            false
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for interrupt: {}", e);
            }
            info!("Received interrupt, shutting down");
            reader_task.abort();
            true
        }
    };

    // Lines first, then batches, then the queue itself
    agent_cancel.cancel();
    if let Err(e) = agent_task.await {
        error!("Logs agent task failed: {}", e);
    }

    shipper_cancel.cancel();
    if let Err(e) = shipper_task.await {
        error!("Shipper task failed: {}", e);
    }

    match queue_handle.len().await {
        Ok(0) => debug!("All queued log events were shipped"),
        Ok(pending) => error!("Shutting down with {} undelivered log events", pending),
        Err(e) => error!("Failed to read final queue length: {}", e),
    }
    if let Err(e) = queue_handle.shutdown() {
        error!("Failed to stop queue service: {}", e);
    }
    if let Err(e) = queue_task.await {
        error!("Queue service task failed: {}", e);
    }

    if interrupted {
        // stdin may still be parked in a blocking read
        process::exit(0);
    }
}
