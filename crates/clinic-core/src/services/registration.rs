//! Walk-in patient registration
//!
//! A patient registered against a doctor goes straight to the front of
//! that doctor's line for today.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use crate::queue::QueueEngine;
use crate::types::{Caller, Patient, RegisterPatientRequest, Role};
use crate::Result;

/// A freshly registered patient and their place in line, if queueing
/// succeeded
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredPatient {
    #[serde(flatten)]
    pub patient: Patient,
    pub queue_position: Option<i64>,
}

pub struct PatientRegistrationService {
    engine: Arc<QueueEngine>,
}

impl PatientRegistrationService {
    pub fn new(engine: Arc<QueueEngine>) -> Self {
        Self { engine }
    }

    /// Register a patient and put them first in the doctor's line today.
    /// Reception only.
    pub async fn register_patient(
        &self,
        caller: &Caller,
        request: RegisterPatientRequest,
    ) -> Result<RegisteredPatient> {
        caller.require_any(&[Role::Reception], "register patients")?;
        request.validate()?;

        let db = self.engine.database();
        let doctor = db.get_doctor(request.doctor_id).await?;
        let patient = db.create_patient(&request).await?;

        let queue_position = match self.engine.enqueue_front(patient.id, doctor.id, None).await {
            Ok(outcome) => Some(outcome.position()),
            Err(e) => {
                warn!(
                    "Patient {} registered but could not be queued for doctor {}: {}",
                    patient.id, doctor.id, e
                );
                None
            }
        };

        info!(
            "Reception user {} registered patient {} for {}",
            caller.user_id, patient.id, doctor.full_name
        );
        Ok(RegisteredPatient {
            patient,
            queue_position,
        })
    }
}
