//! Database schema definitions for the clinic
//!
//! The two unique indexes on `queue_entries` back the queue invariants at
//! the store level: one (doctor, date, position) slot per entry, and one
//! entry per (patient, doctor, date).
//!
//! `patients.full_name_folded` holds the Unicode lowercase form of the name.
//! SQLite's `lower()` folds ASCII only, so name search matches against it.

use sqlx::SqlitePool;
use tracing::debug;

use crate::Result;

const CREATE_STAFF: &str = r#"
    CREATE TABLE IF NOT EXISTS staff (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        full_name TEXT NOT NULL,
        role TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_PATIENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS patients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_uid BLOB NOT NULL UNIQUE,
        full_name TEXT NOT NULL,
        full_name_folded TEXT NOT NULL,
        birth_date TEXT NOT NULL,
        gender TEXT NOT NULL,
        phone TEXT NOT NULL,
        passport TEXT,
        address TEXT,
        email TEXT,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_APPOINTMENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        doctor_id INTEGER NOT NULL REFERENCES staff(id) ON DELETE CASCADE,
        patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'scheduled',
        notes TEXT,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_QUEUE_ENTRIES: &str = r#"
    CREATE TABLE IF NOT EXISTS queue_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
        doctor_id INTEGER NOT NULL REFERENCES staff(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        queue_date TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_patients_full_name ON patients(full_name)",
    "CREATE INDEX IF NOT EXISTS idx_patients_phone ON patients(phone)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_doctor_date ON appointments(doctor_id, date)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_queue_partition_position
        ON queue_entries(doctor_id, queue_date, position)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_queue_patient_once
        ON queue_entries(patient_id, doctor_id, queue_date)",
    "CREATE INDEX IF NOT EXISTS idx_queue_date ON queue_entries(queue_date)",
];

/// Create all tables and indexes if they do not exist yet
pub async fn initialize(pool: &SqlitePool) -> Result<()> {
    debug!("Creating clinic database schema");

    for ddl in [CREATE_STAFF, CREATE_PATIENTS, CREATE_APPOINTMENTS, CREATE_QUEUE_ENTRIES] {
        sqlx::query(ddl).execute(pool).await?;
    }

    for ddl in CREATE_INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    Ok(())
}
