//! Staff directory operations
//!
//! Staff accounts (and their credentials) are owned by the auth service;
//! this table only mirrors what the clinic needs to resolve doctors.

use chrono::Utc;
use tracing::info;
use validator::Validate;

use super::ClinicDatabase;
use crate::types::{NewStaff, Role, Staff};
use crate::{Error, Result};

impl ClinicDatabase {
    /// Provision a staff record
    pub async fn create_staff(&self, request: NewStaff) -> Result<Staff> {
        request.validate()?;

        let staff = sqlx::query_as::<_, Staff>(
            "INSERT INTO staff (username, full_name, role, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, username, full_name, role, created_at",
        )
        .bind(&request.username)
        .bind(&request.full_name)
        .bind(request.role)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await?;

        info!("Provisioned {} '{}' (id {})", staff.role, staff.username, staff.id);
        Ok(staff)
    }

    pub async fn get_staff(&self, id: i64) -> Result<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT id, username, full_name, role, created_at FROM staff WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(staff)
    }

    /// Resolve a doctor, failing with `DoctorNotFound` if the id is unknown
    /// or belongs to a non-doctor.
    pub async fn get_doctor(&self, id: i64) -> Result<Staff> {
        match self.get_staff(id).await? {
            Some(staff) if staff.role == Role::Doctor => Ok(staff),
            _ => Err(Error::DoctorNotFound(id)),
        }
    }

    pub async fn list_doctors(&self) -> Result<Vec<Staff>> {
        let doctors = sqlx::query_as::<_, Staff>(
            "SELECT id, username, full_name, role, created_at FROM staff
             WHERE role = ?1 ORDER BY full_name",
        )
        .bind(Role::Doctor)
        .fetch_all(self.pool())
        .await?;

        Ok(doctors)
    }
}
