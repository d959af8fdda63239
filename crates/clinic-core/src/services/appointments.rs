//! Appointment booking
//!
//! Booking an appointment appends the patient to the doctor's line for
//! today, whatever day the appointment itself is on. The queue is a side
//! effect: if it fails, the booking still succeeds.

use std::sync::Arc;

use tracing::{debug, warn};
use validator::Validate;

use crate::queue::QueueEngine;
use crate::types::{Appointment, Caller, CreateAppointmentRequest, Role};
use crate::Result;

pub struct AppointmentService {
    engine: Arc<QueueEngine>,
}

impl AppointmentService {
    pub fn new(engine: Arc<QueueEngine>) -> Self {
        Self { engine }
    }

    /// Book an appointment. Reception only.
    pub async fn create_appointment(
        &self,
        caller: &Caller,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment> {
        caller.require_any(&[Role::Reception], "create appointments")?;
        request.validate()?;

        let db = self.engine.database();
        db.get_doctor(request.doctor_id).await?;
        db.require_patient(request.patient_id).await?;

        let appointment = db.insert_appointment(&request).await?;

        match self
            .engine
            .enqueue_append(appointment.patient_id, appointment.doctor_id, None)
            .await
        {
            Ok(outcome) => debug!(
                "Appointment {} holds queue position {} on {}",
                appointment.id,
                outcome.position(),
                outcome.entry().queue_date
            ),
            Err(e) => warn!(
                "Appointment {} booked but queueing patient {} failed: {}",
                appointment.id, appointment.patient_id, e
            ),
        }

        Ok(appointment)
    }
}
