use axum::{
    extract::{Query, State},
    response::Json,
};
use employee_events::CountryChecklist;
use serde::Deserialize;

use crate::error::ServiceError;
use crate::AppState;

#[derive(Deserialize)]
pub struct CountryQuery {
    pub country: Option<String>,
}

impl CountryQuery {
    pub fn require_country(&self) -> Result<&str, ServiceError> {
        self.country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServiceError::BadRequest("country is required".to_string()))
    }
}

// GET /api/checklists?country=USA
pub async fn get_checklist(
    State(state): State<AppState>,
    Query(query): Query<CountryQuery>,
) -> Result<Json<CountryChecklist>, ServiceError> {
    let country = query.require_country()?;
    let checklist = state.checklists.country_checklist(country).await?;
    Ok(Json(checklist))
}
