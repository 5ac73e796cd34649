use common::FieldError;
use thiserror::Error;
use uuid::Uuid;

/// Error types for the store module
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested row does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// The input violates a data rule (duplicate username, paid > amount, ...)
    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    /// The locked row no longer belongs to the owner the caller expected
    #[error("{entity} {id} is owned by someone else")]
    OwnerMismatch { entity: &'static str, id: Uuid },

    /// Error from the database operations
    #[error("Database error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    /// Hashing a password failed or its worker task died
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn invalid(field: &str, message: &str) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<FieldError> for StoreError {
    fn from(error: FieldError) -> Self {
        Self::Validation(vec![error])
    }
}

/// Type alias for Result with StoreError
pub type Result<T> = std::result::Result<T, StoreError>;
