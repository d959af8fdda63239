//! # Clinic-Core
//!
//! Clinic backend core: patients, appointments and the per-doctor daily
//! visit queue.
//!
//! This crate provides:
//! - Patient, staff and appointment storage in SQLite
//! - The daily queue engine with append and front-insert policies
//! - A background task that expires yesterday's queues
//! - REST API over the queue and its two upstream actions
//!
//! ## Architecture
//!
//! Token issuance and verification live in an external auth gateway, which
//! forwards the verified caller identity. Every queue invariant is enforced
//! by store transactions plus unique indexes, so any number of handlers can
//! share one [`QueueEngine`].

pub mod error;
pub mod config;
pub mod logging;
pub mod clock;
pub mod types;
pub mod database;
pub mod queue;
pub mod services;
pub mod api;

use std::sync::Arc;

pub use error::{Error, Result};
pub use config::ClinicConfig;
pub use clock::{Clock, FixedClock, SystemClock};
pub use types::{Caller, Role, Patient, Staff, Appointment};
pub use database::ClinicDatabase;
pub use queue::{DailyResetScheduler, EnqueueOutcome, PartitionKey, QueueEngine, QueueEntry, QueuePartition};
pub use services::{AppointmentService, PatientRegistrationService, RegisteredPatient};
pub use api::{create_router, ApiState};

/// A running clinic core: engine plus the optional reset task
pub struct Clinic {
    pub engine: Arc<QueueEngine>,
    pub scheduler: Option<DailyResetScheduler>,
}

impl Clinic {
    pub fn router(&self) -> axum::Router {
        create_router(ApiState::new(self.engine.clone()))
    }
}

/// Initialize the clinic core from configuration
pub async fn init(config: &ClinicConfig) -> Result<Clinic> {
    config.validate()?;

    let db = ClinicDatabase::connect(&config.database).await?;
    let engine = Arc::new(QueueEngine::new(db, Arc::new(SystemClock)));

    let scheduler = if config.queue.scheduler_enabled {
        Some(DailyResetScheduler::spawn(engine.clone(), config.queue.reset_time()?))
    } else {
        None
    };

    Ok(Clinic { engine, scheduler })
}
