//! Employee record as owned by the HR service, plus the paged listing shape of its read API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::lenient;

/// Snapshot of one employee. Every field defaults and decodes leniently, so
/// partial or loosely typed snapshots (a delete fired after the row was
/// cleared, a numeric `ssn`) still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient::decimal")]
    pub salary: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub country: String,
    // USA
    #[serde(deserialize_with = "lenient::opt_text")]
    pub ssn: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub address: Option<String>,
    // Germany
    #[serde(deserialize_with = "lenient::opt_text")]
    pub goal: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub tax_id: Option<String>,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EmployeeRecord {
    /// "name last_name", trimmed when either part is missing.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.last_name).trim().to_string()
    }
}

/// Pagination metadata returned next to a page of employees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub current_page: Option<i64>,
    pub last_page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<u64>,
}

/// `GET /api/employees` body: `{data: [...], meta: {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeePage {
    pub data: Vec<EmployeeRecord>,
    pub meta: PageMeta,
}
