use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::optimizer::OptimizeError;

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be turned into a model.
    #[error("{0}")]
    BadPayload(String),

    /// The model was fine but the solve failed.
    #[error("{0}")]
    Optimization(String),
}

/// Error envelope serialized to JSON, matching the service's wire contract.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Optimization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OptimizeError> for ApiError {
    fn from(error: OptimizeError) -> Self {
        if error.is_caller_error() {
            ApiError::BadPayload(error.to_string())
        } else {
            ApiError::Optimization(error.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::BadPayload(detail) => {
                tracing::debug!(%detail, "rejected payload");
            }
            ApiError::Optimization(detail) => {
                tracing::error!(%detail, "optimization failed");
            }
        }

        let body = ErrorResponse { error: "internal_error", detail: self.to_string() };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_fault_attribution() {
        assert_eq!(
            ApiError::BadPayload("bad key".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Optimization("infeasible".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn caller_errors_map_to_bad_payload() {
        let err: ApiError = OptimizeError::MalformedKey { key: "x".into() }.into();
        assert!(matches!(err, ApiError::BadPayload(_)));

        let err: ApiError = OptimizeError::Infeasible.into();
        assert!(matches!(err, ApiError::Optimization(_)));
    }
}
