use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("Provider has no published availability")]
    NotFound,

    #[error("Not authorized to manage this provider's availability")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DatabaseError> for AvailabilityError {
    fn from(err: DatabaseError) -> Self {
        AvailabilityError::Storage(err.to_string())
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::NotFound => AppError::NotFound(err.to_string()),
            AvailabilityError::Forbidden => AppError::Forbidden(err.to_string()),
            AvailabilityError::Validation(msg) => AppError::ValidationError(msg),
            AvailabilityError::Storage(msg) => AppError::Database(msg),
        }
    }
}
