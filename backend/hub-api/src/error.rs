use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::upstream::UpstreamError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    /// The HR read API could not be reached while recomputing a view. Not retried here.
    #[error("{resource} unavailable: {source}")]
    UpstreamUnavailable {
        resource: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl ServiceError {
    pub fn upstream(resource: &'static str) -> impl FnOnce(UpstreamError) -> Self {
        move |source| ServiceError::UpstreamUnavailable { resource, source }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": message}))).into_response()
            }
            ServiceError::UpstreamUnavailable { resource, source } => {
                tracing::error!("Failed to load {}: {}", resource, source);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(serde_json::json!({"error": format!("Failed to load {}", resource)})),
                )
                    .into_response()
            }
        }
    }
}
