//! Per-message handling for employee events.
//!
//! ```text
//! Received -> decode --malformed--> Dropped (ack)
//!                    \--ok--> invalidate -> broadcast -> Acknowledged (ack)
//!                                  \___ any failure ___/--> Requeued (nack, requeue)
//! ```
//!
//! Processing is idempotent: invalidation is delete-if-present and duplicate
//! broadcasts are harmless, so a redelivered message only costs redundant work.

use std::sync::Arc;

use employee_events::{missing_field_messages, validate_employee, EmployeeRecord};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::{CacheError, DerivedViewCache};
use crate::notifications::{
    checklist_topic, employees_topic, ChecklistUpdated, EmployeeDataUpdated, NotifyError, Notifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Invalidation and broadcast completed; ack.
    Acknowledged,
    /// Poison message; ack without retry.
    Dropped,
    /// Transient failure; nack with requeue.
    Requeued,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Malformed {
    #[error("body is not a JSON object: {0}")]
    NotJson(String),

    #[error("missing or empty {0}")]
    MissingField(&'static str),
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("cache invalidation failed: {0}")]
    Invalidate(#[from] CacheError),

    #[error("broadcast failed: {0}")]
    Broadcast(#[from] NotifyError),
}

/// The parts of an envelope the processor relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub event_type: String,
    pub country: String,
    /// Raw `data` object, forwarded untouched to employee subscribers.
    pub data: Option<Value>,
}

impl DecodedEvent {
    /// `data.employee` when present, otherwise `data` itself. `None` when there
    /// is no non-empty object to validate (delete events may carry none).
    pub fn employee_snapshot(&self) -> Option<&Map<String, Value>> {
        let data = self.data.as_ref()?;
        let snapshot = data.get("employee").unwrap_or(data);
        snapshot.as_object().filter(|m| !m.is_empty())
    }
}

fn required_str(body: &Map<String, Value>, field: &'static str) -> Result<String, Malformed> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or(Malformed::MissingField(field))
}

/// Parse a delivery body. `event_type` and `country` must be non-empty strings.
pub fn decode(body: &[u8]) -> Result<DecodedEvent, Malformed> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| Malformed::NotJson(e.to_string()))?;
    let Value::Object(mut object) = value else {
        return Err(Malformed::NotJson("top-level value is not an object".to_string()));
    };

    let event_type = required_str(&object, "event_type")?;
    let country = required_str(&object, "country")?;
    let data = object.remove("data").filter(|d| !d.is_null());

    Ok(DecodedEvent {
        event_type,
        country,
        data,
    })
}

#[derive(Clone)]
pub struct EmployeeEventProcessor {
    cache: DerivedViewCache,
    notifier: Arc<dyn Notifier>,
}

impl EmployeeEventProcessor {
    pub fn new(cache: DerivedViewCache, notifier: Arc<dyn Notifier>) -> Self {
        Self { cache, notifier }
    }

    /// Run one delivery through the state machine and report how to settle it.
    pub async fn process(&self, body: &[u8]) -> ProcessOutcome {
        let event = match decode(body) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping invalid event payload: {}", e);
                return ProcessOutcome::Dropped;
            }
        };

        info!("Processing {} for country {}", event.event_type, event.country);

        match self.apply(&event).await {
            Ok(()) => ProcessOutcome::Acknowledged,
            Err(e) => {
                error!(
                    "Failed to process {} for {}, requeueing: {}",
                    event.event_type, event.country, e
                );
                ProcessOutcome::Requeued
            }
        }
    }

    /// Invalidate then broadcast for an already decoded event.
    pub async fn apply(&self, event: &DecodedEvent) -> Result<(), ProcessError> {
        let invalidation = self.cache.invalidate_country(&event.country).await?;
        match invalidation.scoped_removed {
            Some(removed) => info!(
                "Invalidated cache for country: {} ({} employee views)",
                event.country, removed
            ),
            None => warn!(
                "Invalidated checklist for {}; employee views expire by TTL",
                event.country
            ),
        }

        self.broadcast(event).await?;
        Ok(())
    }

    async fn broadcast(&self, event: &DecodedEvent) -> Result<(), NotifyError> {
        let missing_fields = self.missing_fields(event);

        let checklist = ChecklistUpdated::new(&event.country, &event.event_type, missing_fields);
        self.notifier.notify(
            &checklist_topic(&event.country),
            ChecklistUpdated::NAME,
            serde_json::to_value(&checklist)?,
        )
        .await?;

        let employees = EmployeeDataUpdated::new(&event.country, &event.event_type, event.data.clone());
        self.notifier.notify(
            &employees_topic(&event.country),
            EmployeeDataUpdated::NAME,
            serde_json::to_value(&employees)?,
        )
        .await?;

        Ok(())
    }

    /// Incomplete-field messages for the snapshot carried by the event.
    ///
    /// A snapshot that cannot be read is scored as an empty record, so every
    /// rule of the country reports missing rather than the event claiming
    /// complete data.
    pub fn missing_fields(&self, event: &DecodedEvent) -> Vec<String> {
        let Some(snapshot) = event.employee_snapshot() else {
            return Vec::new();
        };

        let employee = serde_json::from_value::<EmployeeRecord>(Value::Object(snapshot.clone()))
            .unwrap_or_else(|e| {
                warn!("Employee snapshot could not be read, scoring it as empty: {}", e);
                EmployeeRecord::default()
            });

        missing_field_messages(&validate_employee(&employee, &event.country))
    }
}
