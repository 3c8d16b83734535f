use async_trait::async_trait;
use tracing::{debug, error};

use crate::broker::{with_session, BrokerConfig};
use crate::envelope::EventEnvelope;
use crate::error::BrokerError;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<(), BrokerError>;
}

/// Publishes each envelope over its own scoped broker session.
#[derive(Debug, Clone)]
pub struct AmqpPublisher {
    config: BrokerConfig,
}

impl AmqpPublisher {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EventPublisher for AmqpPublisher {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<(), BrokerError> {
        let body = envelope.to_json_bytes()?;
        let routing_key = envelope.routing_key();
        with_session(&self.config, |session| async move {
            session.publish(routing_key, &body).await
        })
        .await?;

        debug!(
            "Published {} {} for employee {} ({})",
            envelope.event_type(),
            envelope.event_id(),
            envelope.employee_id(),
            envelope.country()
        );
        Ok(())
    }
}

/// Hand a committed mutation's envelope to the broker. Failures are logged and
/// swallowed: the mutation is already durable and derived views heal through TTL.
pub async fn publish_committed(publisher: &dyn EventPublisher, envelope: EventEnvelope) {
    if let Err(e) = publisher.publish(&envelope).await {
        error!(
            "Failed to publish {} {} for employee {}: {}",
            envelope.event_type(),
            envelope.event_id(),
            envelope.employee_id(),
            e
        );
    }
}
