//! Read path for derived views: cache first, HR service on a miss.

use std::sync::Arc;

use employee_events::{summarize_country, CountryChecklist, EmployeePage, EmployeeRecord};

use crate::cache::{keys, DerivedViewCache};
use crate::error::ServiceError;
use crate::upstream::{collect_all, EmployeeSource};

pub const DEFAULT_PER_PAGE: u32 = 15;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Clone)]
pub struct ChecklistService {
    cache: DerivedViewCache,
    source: Arc<dyn EmployeeSource>,
    page_size: u32,
}

impl ChecklistService {
    /// `page_size` is the page length used when walking the full country listing.
    pub fn new(cache: DerivedViewCache, source: Arc<dyn EmployeeSource>, page_size: u32) -> Self {
        Self {
            cache,
            source,
            page_size: page_size.max(1),
        }
    }

    pub fn cache(&self) -> &DerivedViewCache {
        &self.cache
    }

    /// Country-wide checklist, recomputed from every employee on a cache miss.
    pub async fn country_checklist(&self, country: &str) -> Result<CountryChecklist, ServiceError> {
        self.cache
            .get_or_compute(&keys::checklist(country), || async {
                let employees = collect_all(self.source.as_ref(), country, self.page_size)
                    .await
                    .map_err(ServiceError::upstream("checklist"))?;
                Ok(summarize_country(country, &employees))
            })
            .await
    }

    /// One page of the country's employees. `per_page` is clamped to 1..=100 and `page` to >= 1.
    pub async fn employee_page(
        &self,
        country: &str,
        page: u32,
        per_page: u32,
    ) -> Result<EmployeePage, ServiceError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        self.cache
            .get_or_compute(&keys::employee_page(country, page, per_page), || async {
                self.source
                    .fetch_page(country, page, per_page)
                    .await
                    .map_err(ServiceError::upstream("employees"))
            })
            .await
    }

    pub async fn employee(&self, country: &str, id: i64) -> Result<EmployeeRecord, ServiceError> {
        self.cache
            .get_or_compute(&keys::employee(country, id), || async {
                self.source
                    .fetch_employee(id, country)
                    .await
                    .map_err(ServiceError::upstream("employee"))
            })
            .await
    }
}
