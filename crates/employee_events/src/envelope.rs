//! Event envelope published by the HR service after a committed employee mutation.
//!
//! Wire format (UTF-8 JSON):
//!
//! ```text
//! { "event_type": "EmployeeUpdated", "event_id": "<uuid>", "timestamp": "<rfc3339>",
//!   "country": "USA",
//!   "data": { "employee_id": 7, "changed_fields": ["salary"], "employee": { ... } } }
//! ```
//!
//! `event_id` is unique per publish but is not used for deduplication downstream;
//! redelivery is absorbed by idempotent processing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::EmployeeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    EmployeeCreated,
    EmployeeUpdated,
    EmployeeDeleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::EmployeeCreated => "EmployeeCreated",
            EventType::EmployeeUpdated => "EmployeeUpdated",
            EventType::EmployeeDeleted => "EmployeeDeleted",
        }
    }

    /// Routing key under the `employee.#` binding.
    pub fn routing_key(&self) -> &'static str {
        match self {
            EventType::EmployeeCreated => "employee.created",
            EventType::EmployeeUpdated => "employee.updated",
            EventType::EmployeeDeleted => "employee.deleted",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeData {
    pub employee_id: i64,
    pub changed_fields: Vec<String>,
    pub employee: Value,
}

/// Immutable once built: fields are private and only readable through getters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    event_type: EventType,
    event_id: Uuid,
    #[serde(with = "rfc3339")]
    timestamp: DateTime<Utc>,
    country: String,
    data: EnvelopeData,
}

impl EventEnvelope {
    pub fn created(employee: &EmployeeRecord) -> Self {
        Self::build(EventType::EmployeeCreated, employee, Vec::new())
    }

    /// `changed_fields` lists the attributes the committed update actually changed.
    pub fn updated(employee: &EmployeeRecord, changed_fields: Vec<String>) -> Self {
        Self::build(EventType::EmployeeUpdated, employee, changed_fields)
    }

    pub fn deleted(employee: &EmployeeRecord) -> Self {
        Self::build(EventType::EmployeeDeleted, employee, Vec::new())
    }

    fn build(event_type: EventType, employee: &EmployeeRecord, changed_fields: Vec<String>) -> Self {
        // A record always serializes; fall back to an empty snapshot rather than failing a committed mutation.
        let snapshot = serde_json::to_value(employee).unwrap_or(Value::Object(Default::default()));
        Self {
            event_type,
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            country: employee.country.clone(),
            data: EnvelopeData {
                employee_id: employee.id,
                changed_fields,
                employee: snapshot,
            },
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn employee_id(&self) -> i64 {
        self.data.employee_id
    }

    pub fn changed_fields(&self) -> &[String] {
        &self.data.changed_fields
    }

    pub fn employee(&self) -> &Value {
        &self.data.employee
    }

    pub fn routing_key(&self) -> &'static str {
        self.event_type.routing_key()
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

mod rfc3339 {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, false))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
