use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use common::FieldError;
use compute::AccessError;
use thiserror::Error;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

/// Everything a handler can fail with.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Malformed request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("Malformed path parameter: {0}")]
    Path(#[from] PathRejection),
}

impl ApiError {
    fn into_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::Access(AccessError::NotFound(entity)) => {
                warn!("{} not found", entity);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new(format!("{entity} not found"), "NOT_FOUND"),
                )
            }
            ApiError::Access(AccessError::Validation(fields)) => {
                warn!(?fields, "Request failed validation");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("Validation failed", "VALIDATION_ERROR").with_fields(fields),
                )
            }
            ApiError::Access(AccessError::Forbidden) => {
                warn!("Access denied");
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse::new("Access denied", "FORBIDDEN"),
                )
            }
            ApiError::Access(AccessError::Unauthorized) => {
                warn!("Request without a usable identity");
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("Unauthorized", "UNAUTHORIZED"),
                )
            }
            ApiError::Access(AccessError::Storage(details)) => {
                error!("Storage failure: {}", details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error", "STORAGE_ERROR"),
                )
            }
            ApiError::Body(rejection) => {
                warn!("Rejected request body: {}", rejection.body_text());
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("Validation failed", "VALIDATION_ERROR")
                        .with_fields(vec![FieldError::new("body", rejection.body_text())]),
                )
            }
            ApiError::Path(rejection) => {
                warn!("Rejected path parameter: {}", rejection.body_text());
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("Validation failed", "VALIDATION_ERROR")
                        .with_fields(vec![FieldError::new("id", "Must be a UUID")]),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_parts();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_errors_map_to_status_and_code() {
        let cases = [
            (AccessError::NotFound("Deal".to_string()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AccessError::invalid("amount", "bad"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (AccessError::Forbidden, StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AccessError::Unauthorized, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (
                AccessError::Storage("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
            ),
        ];

        for (error, status, code) in cases {
            let (actual_status, body) = ApiError::from(error).into_parts();
            assert_eq!(actual_status, status);
            assert_eq!(body.code, code);
            assert!(!body.success);
        }
    }

    #[test]
    fn test_storage_details_are_not_exposed() {
        let (_, body) = ApiError::from(AccessError::Storage("secret table".to_string())).into_parts();
        assert!(!body.error.contains("secret"));
        assert!(body.fields.is_none());
    }

    #[test]
    fn test_validation_lists_fields() {
        let error = AccessError::Validation(vec![
            FieldError::new("amount", "Must be positive"),
            FieldError::new("project", "Unknown project"),
        ]);
        let (_, body) = ApiError::from(error).into_parts();
        let fields = body.fields.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].field, "project");
    }
}
