//! Shared fixtures for clinic-core integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use clinic_core::types::{NewStaff, RegisterPatientRequest};
use clinic_core::{Caller, ClinicDatabase, FixedClock, Patient, QueueEngine, Role, Staff};

/// A clinic backed by a fresh SQLite file, with one doctor, one
/// receptionist and one administrator provisioned
pub struct TestClinic {
    _dir: TempDir,
    pub db: ClinicDatabase,
    pub engine: Arc<QueueEngine>,
    pub clock: FixedClock,
    pub doctor: Staff,
    pub reception: Staff,
    pub admin: Staff,
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
}

pub fn yesterday() -> NaiveDate {
    today().pred_opt().unwrap()
}

pub fn tomorrow() -> NaiveDate {
    today().succ_opt().unwrap()
}

pub async fn setup() -> TestClinic {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("clinic.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let db = ClinicDatabase::open(&db_url).await.unwrap();
    let clock = FixedClock::on(today());
    let engine = Arc::new(QueueEngine::new(db.clone(), Arc::new(clock.clone())));

    let doctor = add_staff(&db, "dr_grey", "Meredith Grey", Role::Doctor).await;
    let reception = add_staff(&db, "front_desk", "Pam Beesly", Role::Reception).await;
    let admin = add_staff(&db, "admin", "Clinic Admin", Role::Admin).await;

    TestClinic {
        _dir: dir,
        db,
        engine,
        clock,
        doctor,
        reception,
        admin,
    }
}

pub async fn add_staff(db: &ClinicDatabase, username: &str, full_name: &str, role: Role) -> Staff {
    db.create_staff(NewStaff {
        username: username.to_string(),
        full_name: full_name.to_string(),
        role,
    })
    .await
    .unwrap()
}

pub fn patient_request(full_name: &str, doctor_id: i64) -> RegisterPatientRequest {
    RegisterPatientRequest {
        full_name: full_name.to_string(),
        birth_date: NaiveDate::from_ymd_opt(1985, 7, 14).unwrap(),
        gender: "female".to_string(),
        phone: "+1 555 0100".to_string(),
        passport: None,
        address: None,
        email: None,
        doctor_id,
    }
}

impl TestClinic {
    pub async fn add_patient(&self, full_name: &str) -> Patient {
        self.db
            .create_patient(&patient_request(full_name, self.doctor.id))
            .await
            .unwrap()
    }

    pub async fn add_patients(&self, count: usize) -> Vec<Patient> {
        let mut patients = Vec::with_capacity(count);
        for i in 0..count {
            patients.push(self.add_patient(&format!("Patient {:03}", i)).await);
        }
        patients
    }

    pub async fn add_doctor(&self, username: &str) -> Staff {
        add_staff(&self.db, username, &format!("Dr {}", username), Role::Doctor).await
    }

    pub fn doctor_caller(&self) -> Caller {
        Caller::new(self.doctor.id, Role::Doctor)
    }

    pub fn reception_caller(&self) -> Caller {
        Caller::new(self.reception.id, Role::Reception)
    }

    pub fn admin_caller(&self) -> Caller {
        Caller::new(self.admin.id, Role::Admin)
    }

    /// Patient ids of the doctor's line on `date`, in order
    pub async fn line(&self, doctor_id: i64, date: NaiveDate) -> Vec<i64> {
        self.engine
            .partition(doctor_id, Some(date))
            .await
            .unwrap()
            .patient_ids()
    }
}
