// Round trip through a live RabbitMQ: publish an employee event, then drain it

use employee_events::{AmqpPublisher, BrokerConfig, EmployeeRecord, EventEnvelope, EventPublisher};
use hub_api::cache::{keys, CacheStore, MemoryCache};
use hub_api::consumer;
use std::sync::Arc;
use std::time::Duration;

mod test_helpers;
use test_helpers::*;

#[tokio::test]
#[ignore] // Ignore by default - requires RabbitMQ (RABBITMQ_HOST etc.)
async fn test_published_event_is_drained_and_invalidates() {
    let config = BrokerConfig::from_env();
    let store = Arc::new(MemoryCache::new());
    store
        .set(&keys::checklist("USA"), "{}".to_string(), Duration::from_secs(60))
        .await
        .unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let processor = processor_with(store.clone(), notifier.clone());

    // Start from an empty queue.
    consumer::pull(&config, &processor, Duration::from_secs(5), None)
        .await
        .unwrap();

    let employee = EmployeeRecord {
        id: 42,
        name: "Jane".to_string(),
        last_name: "Roe".to_string(),
        country: "USA".to_string(),
        ..Default::default()
    };
    AmqpPublisher::new(config.clone())
        .publish(&EventEnvelope::updated(&employee, vec!["ssn".to_string()]))
        .await
        .unwrap();

    let summary = consumer::pull(&config, &processor, Duration::from_secs(5), Some(1))
        .await
        .unwrap();

    assert_eq!(summary.acknowledged, 1);
    assert!(store.get(&keys::checklist("USA")).await.unwrap().is_none());
    assert!(notifier
        .sent()
        .iter()
        .any(|(topic, _, payload)| topic == "checklist.USA"
            && payload["missing_fields"].as_array().is_some_and(|m| !m.is_empty())));
}
