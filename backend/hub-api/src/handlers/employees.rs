use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use employee_events::{EmployeePage, EmployeeRecord};
use serde::{Deserialize, Serialize};

use super::checklists::CountryQuery;
use crate::error::ServiceError;
use crate::services::checklist_service::DEFAULT_PER_PAGE;
use crate::AppState;

#[derive(Deserialize)]
pub struct EmployeeListQuery {
    pub country: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize)]
pub struct EmployeeResponse {
    pub data: EmployeeRecord,
}

// GET /api/employees?country=USA&page=1&per_page=15
pub async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<EmployeeListQuery>,
) -> Result<Json<EmployeePage>, ServiceError> {
    let country = CountryQuery {
        country: query.country,
    };
    let country = country.require_country()?;
    let page = state
        .checklists
        .employee_page(
            country,
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
        .await?;
    Ok(Json(page))
}

// GET /api/employees/:id?country=USA
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<CountryQuery>,
) -> Result<Json<EmployeeResponse>, ServiceError> {
    let country = query.require_country()?;
    let employee = state.checklists.employee(country, id).await?;
    Ok(Json(EmployeeResponse { data: employee }))
}
