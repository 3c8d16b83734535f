//! Shared core for the employee checklist synchronization: the record model,
//! the event envelope and its broker transport, and the completeness rules.

pub mod broker;
pub mod checklist;
pub mod envelope;
pub mod error;
pub mod models;
pub mod mutations;
pub mod publisher;
pub mod utils;

pub use broker::{with_session, BrokerConfig, BrokerSession, SessionHandle};
pub use checklist::{
    missing_field_messages, summarize_country, validate_employee, Country, CountryChecklist,
    EmployeeValidation, FieldCheck,
};
pub use envelope::{EventEnvelope, EventType};
pub use error::BrokerError;
pub use models::{EmployeePage, EmployeeRecord, PageMeta};
pub use mutations::{EmployeeMutations, EmployeeStore, StoreError};
pub use publisher::{publish_committed, AmqpPublisher, EventPublisher};
