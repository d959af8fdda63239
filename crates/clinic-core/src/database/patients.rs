//! Patient record operations

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::ClinicDatabase;
use crate::types::{Patient, PatientFilter, PatientSummary, RegisterPatientRequest};
use crate::{Error, Result};

const PATIENT_COLUMNS: &str = "id, patient_uid, full_name, birth_date, gender, phone, \
                               passport, address, email, created_at";

/// Hard cap on a single search page
pub const MAX_PAGE_SIZE: u32 = 100;

/// Case-folded form of a name for substring search, valid for any alphabet
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

impl ClinicDatabase {
    /// Insert a new patient. Rejects a second patient with the same full
    /// name and birth date.
    pub async fn create_patient(&self, request: &RegisterPatientRequest) -> Result<Patient> {
        if self
            .find_patient_by_identity(&request.full_name, request.birth_date)
            .await?
            .is_some()
        {
            return Err(Error::PatientAlreadyExists(request.full_name.clone()));
        }

        let patient = sqlx::query_as::<_, Patient>(&format!(
            "INSERT INTO patients (patient_uid, full_name, full_name_folded, birth_date, gender,
                                   phone, passport, address, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING {PATIENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&request.full_name)
        .bind(fold_name(&request.full_name))
        .bind(request.birth_date)
        .bind(&request.gender)
        .bind(&request.phone)
        .bind(&request.passport)
        .bind(&request.address)
        .bind(&request.email)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await?;

        info!("Registered patient {} (id {})", patient.patient_uid, patient.id);
        Ok(patient)
    }

    pub async fn get_patient(&self, id: i64) -> Result<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(patient)
    }

    /// Like [`get_patient`](Self::get_patient) but fails with `PatientNotFound`
    pub async fn require_patient(&self, id: i64) -> Result<Patient> {
        self.get_patient(id)
            .await?
            .ok_or(Error::PatientNotFound(id))
    }

    pub async fn find_patient_by_identity(
        &self,
        full_name: &str,
        birth_date: NaiveDate,
    ) -> Result<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE full_name = ?1 AND birth_date = ?2"
        ))
        .bind(full_name)
        .bind(birth_date)
        .fetch_optional(self.pool())
        .await?;

        Ok(patient)
    }

    /// Search patients, newest registration first. When `filter.doctor_id`
    /// is set each hit carries its position in that doctor's queue for
    /// `queue_date`.
    pub async fn search_patients(
        &self,
        filter: &PatientFilter,
        queue_date: NaiveDate,
    ) -> Result<(Vec<PatientSummary>, i64)> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(fold_name);
        let phone = filter.phone.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let limit = filter.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let skip = filter.skip.unwrap_or(0);

        // NULL parameters disable their predicate. instr() keeps user input
        // out of LIKE pattern syntax.
        let predicate = "(?1 IS NULL OR instr(full_name_folded, ?1) > 0)
                     AND (?2 IS NULL OR instr(phone, ?2) > 0)";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM patients WHERE {predicate}"))
                .bind(search.as_deref())
                .bind(phone)
                .fetch_one(self.pool())
                .await?;

        let patients = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE {predicate}
             ORDER BY id DESC LIMIT ?3 OFFSET ?4"
        ))
        .bind(search.as_deref())
        .bind(phone)
        .bind(i64::from(limit))
        .bind(i64::from(skip))
        .fetch_all(self.pool())
        .await?;

        let mut summaries = Vec::with_capacity(patients.len());
        for patient in patients {
            let queue_number = match filter.doctor_id {
                Some(doctor_id) => {
                    sqlx::query_scalar::<_, i64>(
                        "SELECT position FROM queue_entries
                         WHERE patient_id = ?1 AND doctor_id = ?2 AND queue_date = ?3",
                    )
                    .bind(patient.id)
                    .bind(doctor_id)
                    .bind(queue_date)
                    .fetch_optional(self.pool())
                    .await?
                }
                None => None,
            };
            summaries.push(PatientSummary {
                patient,
                queue_number,
            });
        }

        debug!("Patient search returned {} of {}", summaries.len(), total);
        Ok((summaries, total))
    }
}
