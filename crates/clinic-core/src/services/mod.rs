//! Upstream actions that feed the queue as a side effect

pub mod appointments;
pub mod registration;

pub use appointments::AppointmentService;
pub use registration::{PatientRegistrationService, RegisteredPatient};
