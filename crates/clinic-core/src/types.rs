//! Core types for clinic-core

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{Error, Result};

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()-]{5,20}$").expect("phone regex is valid"));

/// Staff role. Roles are assigned by the external auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Reception,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Reception => "reception",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "reception" => Ok(Role::Reception),
            other => Err(Error::validation(format!("unknown role: {}", other))),
        }
    }
}

/// Authenticated identity of whoever is calling into the clinic core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Fail with `Unauthorized` unless the caller holds one of `allowed`
    pub fn require_any(&self, allowed: &[Role], action: &str) -> Result<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(Error::unauthorized(format!(
                "role '{}' may not {}",
                self.role, action
            )))
        }
    }
}

/// Staff member (doctor, receptionist, administrator)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Staff {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Request to provision a staff record
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewStaff {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    pub role: Role,
}

/// Patient record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Patient {
    pub id: i64,
    pub patient_uid: Uuid,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub phone: String,
    pub passport: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to register a walk-in patient directly against a doctor
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterPatientRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub birth_date: NaiveDate,
    #[validate(length(min = 1, max = 20))]
    pub gender: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(max = 50))]
    pub passport: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    /// Doctor whose queue the patient joins
    pub doctor_id: i64,
}

fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    if PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

/// Filter for searching patients
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientFilter {
    /// Case-insensitive substring of the full name
    pub search: Option<String>,
    /// Substring of the phone number
    pub phone: Option<String>,
    /// Annotate results with their position in this doctor's queue today
    pub doctor_id: Option<i64>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

/// Patient search hit
#[derive(Debug, Clone, Serialize)]
pub struct PatientSummary {
    #[serde(flatten)]
    pub patient: Patient,
    pub queue_number: Option<i64>,
}

/// Appointment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Arrived,
    InProgress,
    Done,
    Paid,
}

/// Appointment record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to create an appointment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub date: DateTime<Utc>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
