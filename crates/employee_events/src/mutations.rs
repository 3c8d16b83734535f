//! Post-commit publishing for the HR service's employee writes.
//!
//! The write path calls the publisher explicitly once the store has committed;
//! nothing is inferred from type names.

use async_trait::async_trait;
use thiserror::Error;

use crate::envelope::EventEnvelope;
use crate::models::EmployeeRecord;
use crate::publisher::{publish_committed, EventPublisher};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("employee {0} not found")]
    NotFound(i64),

    #[error("store error: {0}")]
    Backend(String),
}

/// Persistence for employee records. Each call returns only after its transaction committed.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn insert(&self, employee: EmployeeRecord) -> Result<EmployeeRecord, StoreError>;

    /// Returns the committed record and the names of the attributes that changed.
    async fn update(
        &self,
        id: i64,
        employee: EmployeeRecord,
    ) -> Result<(EmployeeRecord, Vec<String>), StoreError>;

    /// Returns the snapshot of the removed record.
    async fn delete(&self, id: i64) -> Result<EmployeeRecord, StoreError>;
}

pub struct EmployeeMutations<S, P> {
    store: S,
    publisher: P,
}

impl<S, P> EmployeeMutations<S, P>
where
    S: EmployeeStore,
    P: EventPublisher,
{
    pub fn new(store: S, publisher: P) -> Self {
        Self { store, publisher }
    }

    pub async fn create(&self, employee: EmployeeRecord) -> Result<EmployeeRecord, StoreError> {
        let created = self.store.insert(employee).await?;
        publish_committed(&self.publisher, EventEnvelope::created(&created)).await;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        employee: EmployeeRecord,
    ) -> Result<EmployeeRecord, StoreError> {
        let (updated, changed_fields) = self.store.update(id, employee).await?;
        publish_committed(
            &self.publisher,
            EventEnvelope::updated(&updated, changed_fields),
        )
        .await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let removed = self.store.delete(id).await?;
        publish_committed(&self.publisher, EventEnvelope::deleted(&removed)).await;
        Ok(())
    }
}
