//! Cross-process notification fan-out over Redis pub/sub.
//!
//! The process that handles an employee event publishes the encoded frame on
//! one Redis channel. Every `serve` process relays that channel into its local
//! [`BroadcastChannel`], so a socket sees the frame whichever process consumed
//! the event.

use std::future::Future;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::backoff::Backoff;
use crate::notifications::{BroadcastChannel, Frame, NotifyError, Notifier};

/// Publishes frames on a Redis channel for every relaying server.
#[derive(Clone)]
pub struct RedisNotifier {
    manager: ConnectionManager,
    channel: String,
}

impl RedisNotifier {
    pub async fn connect(url: &str, channel: &str) -> Result<Self, NotifyError> {
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;

        Ok(Self {
            manager,
            channel: channel.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn notify(&self, topic: &str, event: &str, payload: Value) -> Result<(), NotifyError> {
        let message = Frame::new(topic, event, payload).encode()?;
        let mut conn = self.manager.clone();
        let relays: i64 = conn.publish(&self.channel, message).await?;
        debug!("Published {} on {} to {} relay(s)", event, topic, relays);
        Ok(())
    }
}

/// Hand one relayed payload to local subscribers. Returns false when it is not a frame.
pub fn forward(payload: &str, local: &BroadcastChannel) -> bool {
    match serde_json::from_str::<Frame>(payload) {
        Ok(frame) => {
            let _ = local.send((frame.topic, payload.to_string()));
            true
        }
        Err(e) => {
            warn!("Ignoring relayed payload that is not a notification frame: {}", e);
            false
        }
    }
}

async fn subscribe_and_forward(
    url: &str,
    channel: &str,
    local: &BroadcastChannel,
    backoff: &mut Backoff,
) -> Result<(), NotifyError> {
    let client = Client::open(url)?;
    let mut pubsub = client.get_async_connection().await?.into_pubsub();
    pubsub.subscribe(channel).await?;
    backoff.reset();
    info!("Relaying notifications from Redis channel {}", channel);

    let mut messages = pubsub.on_message();
    while let Some(message) = messages.next().await {
        match message.get_payload::<String>() {
            Ok(payload) => {
                forward(&payload, local);
            }
            Err(e) => warn!("Unreadable relayed notification: {}", e),
        }
    }

    Ok(())
}

/// Relay `channel` into `local` until `shutdown` resolves, resubscribing with backoff.
pub async fn relay<S>(url: String, channel: String, local: BroadcastChannel, shutdown: S)
where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut backoff = Backoff::reconnect();

    loop {
        let result = tokio::select! {
            _ = &mut shutdown => break,
            result = subscribe_and_forward(&url, &channel, &local, &mut backoff) => result,
        };
        match result {
            Ok(()) => warn!("Redis subscription to {} ended; resubscribing", channel),
            Err(e) => error!("Notification relay failed: {}", e),
        }

        let delay = backoff.on_failure();
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!("Notification relay stopped");
}
