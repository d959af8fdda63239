//! Error types for clinic-core

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Clinic errors
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced patient does not exist
    #[error("Patient not found: {0}")]
    PatientNotFound(i64),

    /// Referenced doctor does not exist (or is not a doctor)
    #[error("Doctor not found: {0}")]
    DoctorNotFound(i64),

    /// Referenced queue entry does not exist
    #[error("Queue entry not found: {0}")]
    QueueEntryNotFound(i64),

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(i64),

    /// Patient already has an entry in this doctor's queue for this date
    #[error("Patient {patient_id} already queued for doctor {doctor_id} on {date}")]
    AlreadyQueued {
        patient_id: i64,
        doctor_id: i64,
        date: NaiveDate,
    },

    /// A patient with the same name and birth date is already registered
    #[error("Patient already exists: {0}")]
    PatientAlreadyExists(String),

    /// The doctor already has an appointment at this instant
    #[error("Doctor {doctor_id} is not available at {at}")]
    SlotTaken { doctor_id: i64, at: DateTime<Utc> },

    /// Caller lacks the role required for the operation
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Underlying store unavailable or transaction aborted
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new Validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new Unauthorized error
    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new Config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// True for the NotFound family
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PatientNotFound(_)
                | Self::DoctorNotFound(_)
                | Self::QueueEntryNotFound(_)
                | Self::AppointmentNotFound(_)
        )
    }

    /// True for conflicts with existing state
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyQueued { .. } | Self::PatientAlreadyExists(_) | Self::SlotTaken { .. }
        )
    }

    /// True when the store itself failed
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::Config(error.to_string())
    }
}

/// Result type for clinic operations
pub type Result<T> = std::result::Result<T, Error>;
