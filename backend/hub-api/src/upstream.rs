//! Read side of the HR service: paged listing, single fetch, and the
//! full-country page walk used for country-wide statistics.

use std::time::Duration;

use async_trait::async_trait;
use employee_events::{EmployeePage, EmployeeRecord};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HR service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HR service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HR service response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait EmployeeSource: Send + Sync {
    async fn fetch_page(
        &self,
        country: &str,
        page: u32,
        per_page: u32,
    ) -> Result<EmployeePage, UpstreamError>;

    async fn fetch_employee(&self, id: i64, country: &str)
        -> Result<EmployeeRecord, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct HrServiceClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SingleEmployee {
    data: EmployeeRecord,
}

impl HrServiceClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[async_trait]
impl EmployeeSource for HrServiceClient {
    /// GET /api/employees?country=..&page=..&per_page=.. -> { data, meta }
    async fn fetch_page(
        &self,
        country: &str,
        page: u32,
        per_page: u32,
    ) -> Result<EmployeePage, UpstreamError> {
        let url = format!("{}/api/employees", self.base_url);
        self.get_json(
            &url,
            &[
                ("country", country.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .await
    }

    /// GET /api/employees/{id}?country=.. -> { data: employee }
    async fn fetch_employee(
        &self,
        id: i64,
        country: &str,
    ) -> Result<EmployeeRecord, UpstreamError> {
        let url = format!("{}/api/employees/{}", self.base_url, id);
        let body: SingleEmployee = self
            .get_json(&url, &[("country", country.to_string())])
            .await?;
        Ok(body.data)
    }
}

/// Fetch every employee of `country`, one page at a time starting at page 1.
///
/// The walk stops once the page number reaches `meta.last_page`. A missing,
/// zero or negative `last_page` counts as 1, so a response without metadata
/// ends the walk after the first page.
pub async fn collect_all(
    source: &dyn EmployeeSource,
    country: &str,
    page_size: u32,
) -> Result<Vec<EmployeeRecord>, UpstreamError> {
    let mut employees = Vec::new();
    let mut page: u32 = 1;

    loop {
        let result = source.fetch_page(country, page, page_size).await?;
        employees.extend(result.data);

        let last_page = result
            .meta
            .last_page
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        if i64::from(page) >= last_page {
            break;
        }
        page += 1;
    }

    debug!(
        "Collected {} employees for {} across {} page(s)",
        employees.len(),
        country,
        page
    );
    Ok(employees)
}
