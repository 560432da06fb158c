use thiserror::Error;

use availability_cell::AvailabilityError;
use shared_database::DatabaseError;
use shared_models::error::AppError;

use crate::models::{EffectiveStatus, TransitionAction};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppointmentError {
    #[error("Slot is no longer available")]
    Conflict,

    #[error("Service '{0}' is not offered by this provider")]
    InvalidService(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Appointment not found")]
    NotFound,

    #[error("Provider has no published availability")]
    ProviderNotFound,

    #[error("Not authorized for this appointment")]
    Forbidden,

    #[error("Cannot {action} an appointment that is {from}")]
    InvalidTransition {
        from: EffectiveStatus,
        action: TransitionAction,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DatabaseError> for AppointmentError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation(_) => AppointmentError::Conflict,
            other => AppointmentError::Storage(other.to_string()),
        }
    }
}

impl From<AvailabilityError> for AppointmentError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::NotFound => AppointmentError::ProviderNotFound,
            AvailabilityError::Forbidden => AppointmentError::Forbidden,
            AvailabilityError::Validation(msg) | AvailabilityError::Storage(msg) => {
                AppointmentError::Storage(msg)
            }
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::Conflict | AppointmentError::InvalidTransition { .. } => {
                AppError::Conflict(err.to_string())
            }
            AppointmentError::InvalidService(_) | AppointmentError::InvalidTime(_) => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::NotFound | AppointmentError::ProviderNotFound => {
                AppError::NotFound(err.to_string())
            }
            AppointmentError::Forbidden => AppError::Forbidden(err.to_string()),
            AppointmentError::Storage(msg) => AppError::Database(msg),
        }
    }
}
