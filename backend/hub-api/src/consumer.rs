//! AMQP receive loop for employee events.
//!
//! One process handles one delivery at a time: with prefetch 1 the broker will
//! not push the next message until the current one is acked or nacked.
//! Requeued messages come back with no delay and no retry ceiling.

use std::future::Future;
use std::time::Duration;

use employee_events::{with_session, BrokerConfig, BrokerError, BrokerSession, SessionHandle};
use futures_util::StreamExt;
use lapin::{
    acker::Acker,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicGetOptions, BasicNackOptions, BasicQosOptions,
    },
    types::FieldTable,
};
use tracing::{error, info, warn};

use crate::backoff::Backoff;
use crate::processor::{EmployeeEventProcessor, ProcessOutcome};

const CONSUMER_TAG: &str = "hub-api";

/// Counts reported by a drain run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullSummary {
    pub acknowledged: usize,
    pub dropped: usize,
    pub requeued: usize,
}

impl PullSummary {
    pub fn handled(&self) -> usize {
        self.acknowledged + self.dropped
    }
}

/// Process one body, treating work that outlives `timeout` as transient.
pub async fn process_with_timeout(
    processor: &EmployeeEventProcessor,
    body: &[u8],
    timeout: Duration,
) -> ProcessOutcome {
    match tokio::time::timeout(timeout, processor.process(body)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            error!("Event processing exceeded {:?}; requeueing", timeout);
            ProcessOutcome::Requeued
        }
    }
}

async fn settle(acker: &Acker, outcome: ProcessOutcome) -> Result<(), lapin::Error> {
    match outcome {
        ProcessOutcome::Acknowledged | ProcessOutcome::Dropped => {
            acker.ack(BasicAckOptions::default()).await?;
        }
        ProcessOutcome::Requeued => {
            acker
                .nack(BasicNackOptions {
                    requeue: true,
                    ..BasicNackOptions::default()
                })
                .await?;
        }
    }
    Ok(())
}

/// Consume until `shutdown` resolves, reconnecting with backoff when the broker goes away.
///
/// A delivery in flight when shutdown fires is left unacknowledged and the
/// broker redelivers it.
pub async fn run<S>(
    config: &BrokerConfig,
    processor: &EmployeeEventProcessor,
    processing_timeout: Duration,
    shutdown: S,
) where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut backoff = Backoff::reconnect();

    loop {
        let session = tokio::select! {
            _ = &mut shutdown => break,
            result = BrokerSession::open(config) => result,
        };

        match session {
            Ok(session) => {
                backoff.reset();
                let handle = session.handle();
                let result = tokio::select! {
                    _ = &mut shutdown => {
                        session.close().await;
                        break;
                    }
                    result = consume(&handle, config.prefetch, processor, processing_timeout) => result,
                };
                session.close().await;
                match result {
                    Ok(()) => warn!("Broker closed the consumer stream; reconnecting"),
                    Err(e) => error!("Consumer failed: {}", e),
                }
            }
            Err(e) => error!("Could not connect to RabbitMQ at {}:{}: {}", config.host, config.port, e),
        }

        let delay = backoff.on_failure();
        info!("Reconnecting to RabbitMQ in {:?}", delay);
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!("Employee event consumer stopped");
}

async fn consume(
    handle: &SessionHandle,
    prefetch: u16,
    processor: &EmployeeEventProcessor,
    processing_timeout: Duration,
) -> Result<(), BrokerError> {
    let channel = handle.channel();
    channel
        .basic_qos(prefetch, BasicQosOptions::default())
        .await?;

    let mut consumer = channel
        .basic_consume(
            handle.queue(),
            CONSUMER_TAG,
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await?;

    info!(
        "Listening on queue {} (exchange: {}, prefetch: {})",
        handle.queue(),
        handle.exchange(),
        prefetch
    );

    while let Some(delivery) = consumer.next().await {
        let delivery = delivery?;
        let outcome = process_with_timeout(processor, &delivery.data, processing_timeout).await;
        settle(&delivery.acker, outcome).await?;
    }

    Ok(())
}

/// Drain the queue with `basic_get` until it is empty or `limit` messages were
/// handled. Stops at the first requeued message so it is not fetched straight back.
pub async fn pull(
    config: &BrokerConfig,
    processor: &EmployeeEventProcessor,
    processing_timeout: Duration,
    limit: Option<usize>,
) -> Result<PullSummary, BrokerError> {
    with_session(config, |handle| async move {
        let mut summary = PullSummary::default();

        loop {
            if limit.is_some_and(|limit| summary.handled() >= limit) {
                break;
            }

            let Some(message) = handle
                .channel()
                .basic_get(handle.queue(), BasicGetOptions::default())
                .await?
            else {
                break;
            };

            let outcome =
                process_with_timeout(processor, &message.delivery.data, processing_timeout).await;
            settle(&message.delivery.acker, outcome).await?;

            match outcome {
                ProcessOutcome::Acknowledged => summary.acknowledged += 1,
                ProcessOutcome::Dropped => summary.dropped += 1,
                ProcessOutcome::Requeued => {
                    summary.requeued += 1;
                    break;
                }
            }
        }

        Ok(summary)
    })
    .await
}
