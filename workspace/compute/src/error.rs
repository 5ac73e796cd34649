use common::FieldError;
use store::StoreError;
use thiserror::Error;
use tracing::{error, warn};

/// Error types for the access layer
#[derive(Error, Debug)]
pub enum AccessError {
    /// The requested entity does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// One or more inputs are invalid; every offending field is listed
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// The caller's role or ownership does not allow the operation
    #[error("Access denied")]
    Forbidden,

    /// No usable identity was presented
    #[error("Unauthorized")]
    Unauthorized,

    /// The store failed; details are logged, not exposed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AccessError {
    pub fn invalid(field: &str, message: &str) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<StoreError> for AccessError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity, id } => {
                warn!(entity, %id, "Entity not found");
                AccessError::NotFound(capitalize(entity))
            }
            StoreError::Validation(fields) => AccessError::Validation(fields),
            StoreError::OwnerMismatch { entity, id } => {
                warn!(entity, %id, "Ownership changed before the write");
                AccessError::Forbidden
            }
            StoreError::Storage(err) => {
                error!(?err, "Database error");
                AccessError::Storage(err.to_string())
            }
            StoreError::PasswordHash(message) => {
                error!(%message, "Password hashing failed");
                AccessError::Storage(message)
            }
        }
    }
}

fn capitalize(entity: &str) -> String {
    let mut chars = entity.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Type alias for Result with AccessError
pub type Result<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_store_errors_map_to_access_errors() {
        let not_found: AccessError = StoreError::not_found("deal", Uuid::nil()).into();
        assert!(matches!(not_found, AccessError::NotFound(ref name) if name == "Deal"));

        let invalid: AccessError = StoreError::invalid("paidAmount", "too much").into();
        match invalid {
            AccessError::Validation(fields) => assert_eq!(fields[0].field, "paidAmount"),
            other => panic!("unexpected error: {other:?}"),
        }

        let storage: AccessError =
            StoreError::Storage(sea_orm::DbErr::Custom("boom".to_string())).into();
        assert!(matches!(storage, AccessError::Storage(_)));

        let moved: AccessError = StoreError::OwnerMismatch {
            entity: "deal",
            id: Uuid::nil(),
        }
        .into();
        assert!(matches!(moved, AccessError::Forbidden));
    }
}
