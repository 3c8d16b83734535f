// Shared fakes for the hub-api integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use employee_events::{EmployeePage, EmployeeRecord, PageMeta};
use hub_api::cache::{CacheError, CacheStore, DerivedViewCache, MemoryCache};
use hub_api::notifications::{NotifyError, Notifier};
use hub_api::processor::EmployeeEventProcessor;
use hub_api::upstream::{EmployeeSource, UpstreamError};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn usa_employee(id: i64, complete: bool) -> EmployeeRecord {
    EmployeeRecord {
        id,
        name: format!("Employee{}", id),
        last_name: "Doe".to_string(),
        salary: Some(75000.0),
        country: "USA".to_string(),
        ssn: complete.then(|| "123-45-6789".to_string()),
        address: Some("1 Main St".to_string()),
        ..Default::default()
    }
}

pub fn german_employee(id: i64) -> EmployeeRecord {
    EmployeeRecord {
        id,
        name: "Erika".to_string(),
        last_name: "Mustermann".to_string(),
        salary: Some(65000.0),
        country: "Germany".to_string(),
        goal: Some("Launch".to_string()),
        tax_id: Some("DE123456789".to_string()),
        ..Default::default()
    }
}

pub fn usa_employees(count: i64) -> Vec<EmployeeRecord> {
    (1..=count).map(|id| usa_employee(id, id % 2 == 0)).collect()
}

pub enum LastPage {
    /// ceil(total / per_page), at least 1
    Computed,
    /// No pagination metadata at all
    Missing,
    Fixed(i64),
}

/// In-memory HR read API that records which pages were requested. Like the
/// HR service it filters by the exact country string.
pub struct FakeSource {
    employees: Vec<EmployeeRecord>,
    last_page: LastPage,
    fail_on_page: Option<u32>,
    requested: Mutex<Vec<u32>>,
}

impl FakeSource {
    pub fn new(employees: Vec<EmployeeRecord>) -> Self {
        Self {
            employees,
            last_page: LastPage::Computed,
            fail_on_page: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_last_page(mut self, last_page: LastPage) -> Self {
        self.last_page = last_page;
        self
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmployeeSource for FakeSource {
    async fn fetch_page(
        &self,
        country: &str,
        page: u32,
        per_page: u32,
    ) -> Result<EmployeePage, UpstreamError> {
        self.requested.lock().unwrap().push(page);

        if self.fail_on_page == Some(page) {
            return Err(UpstreamError::Status {
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }

        let matching: Vec<&EmployeeRecord> =
            self.employees.iter().filter(|e| e.country == country).collect();
        let start = ((page - 1) * per_page) as usize;
        let data: Vec<EmployeeRecord> = matching
            .iter()
            .skip(start)
            .take(per_page as usize)
            .map(|e| (*e).clone())
            .collect();

        let total = matching.len() as i64;
        let meta = match self.last_page {
            LastPage::Missing => PageMeta::default(),
            LastPage::Computed => PageMeta {
                current_page: Some(page as i64),
                last_page: Some(((total + per_page as i64 - 1) / per_page as i64).max(1)),
                per_page: Some(per_page as i64),
                total: Some(total as u64),
            },
            LastPage::Fixed(last) => PageMeta {
                current_page: Some(page as i64),
                last_page: Some(last),
                per_page: Some(per_page as i64),
                total: Some(total as u64),
            },
        };

        Ok(EmployeePage { data, meta })
    }

    async fn fetch_employee(
        &self,
        id: i64,
        country: &str,
    ) -> Result<EmployeeRecord, UpstreamError> {
        self.employees
            .iter()
            .find(|e| e.id == id && e.country == country)
            .cloned()
            .ok_or(UpstreamError::Status {
                status: 404,
                body: "Not Found".to_string(),
            })
    }
}

/// Records every notification as (topic, event, payload).
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, Value)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, topic: &str, event: &str, payload: Value) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((topic.to_string(), event.to_string(), payload));
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _topic: &str, _event: &str, _payload: Value) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable("channel closed".to_string()))
    }
}

/// A cache backend that is down.
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
}

/// Delegates to a memory cache after sleeping on every delete.
pub struct SlowStore {
    inner: MemoryCache,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryCache::new(),
            delay,
        }
    }
}

#[async_trait]
impl CacheStore for SlowStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(key).await
    }
}

pub fn cache_over(store: Arc<dyn CacheStore>) -> DerivedViewCache {
    DerivedViewCache::new(store, Duration::from_secs(60))
}

pub fn processor_with(
    store: Arc<dyn CacheStore>,
    notifier: Arc<dyn Notifier>,
) -> EmployeeEventProcessor {
    EmployeeEventProcessor::new(cache_over(store), notifier)
}
