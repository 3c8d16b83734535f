//! Derived-view key templates.
//!
//! The country segment is the country string exactly as queried. The HR
//! service filters by exact country, so `DE` and `Germany` are different
//! listings and must not share entries. Events invalidate with the country
//! stored on the record.

/// `checklist:country:{country}`
pub fn checklist(country: &str) -> String {
    format!("checklist:country:{}", country)
}

/// `employees:{country}:{page}:{perPage}`
pub fn employee_page(country: &str, page: u32, per_page: u32) -> String {
    format!("employees:{}:{}:{}", country, page, per_page)
}

/// `employees:{country}:{id}`
pub fn employee(country: &str, id: i64) -> String {
    format!("employees:{}:{}", country, id)
}

/// Prefix shared by every list/detail entry of one country.
pub fn employees_scope(country: &str) -> String {
    format!("employees:{}:", country)
}
