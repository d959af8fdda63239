//! Appointment record operations

use chrono::{DateTime, Utc};
use tracing::info;

use super::ClinicDatabase;
use crate::types::{Appointment, AppointmentStatus, CreateAppointmentRequest};
use crate::{Error, Result};

const APPOINTMENT_COLUMNS: &str = "id, doctor_id, patient_id, date, status, notes, created_at";

impl ClinicDatabase {
    /// Store a new `scheduled` appointment. Fails with `SlotTaken` when the
    /// doctor already has an appointment at exactly this instant.
    pub async fn insert_appointment(&self, request: &CreateAppointmentRequest) -> Result<Appointment> {
        if self
            .find_appointment_at(request.doctor_id, request.date)
            .await?
            .is_some()
        {
            return Err(Error::SlotTaken {
                doctor_id: request.doctor_id,
                at: request.date,
            });
        }

        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            "INSERT INTO appointments (doctor_id, patient_id, date, status, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(request.doctor_id)
        .bind(request.patient_id)
        .bind(request.date)
        .bind(AppointmentStatus::Scheduled)
        .bind(&request.notes)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await?;

        info!(
            "Appointment {} booked: doctor {} / patient {} at {}",
            appointment.id, appointment.doctor_id, appointment.patient_id, appointment.date
        );
        Ok(appointment)
    }

    pub async fn find_appointment_at(
        &self,
        doctor_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Appointment>> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE doctor_id = ?1 AND date = ?2"
        ))
        .bind(doctor_id)
        .bind(at)
        .fetch_optional(self.pool())
        .await?;

        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: i64) -> Result<Appointment> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or(Error::AppointmentNotFound(id))
    }
}
