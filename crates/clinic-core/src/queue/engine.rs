//! Queue engine
//!
//! Owns every mutation of the per-doctor daily queues. Each operation is a
//! single store transaction, so concurrent callers (request handlers and
//! the daily reset task) never observe a gap or a duplicate position.
//!
//! Positions are shifted in two passes through negative values. SQLite
//! checks unique indexes row by row, and a direct `position = position + 1`
//! would collide with the neighbour that has not been moved yet.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::ledger::{PartitionKey, QueueEntry, QueueLedger, QueuePartition, ENTRY_COLUMNS};
use crate::clock::Clock;
use crate::database::ClinicDatabase;
use crate::types::{Caller, Role};
use crate::{Error, Result};

/// Result of an enqueue request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "entry", rename_all = "snake_case")]
pub enum EnqueueOutcome {
    /// A new entry was placed in the partition
    Created(QueueEntry),
    /// The patient was already in the partition; nothing changed
    AlreadyQueued(QueueEntry),
}

impl EnqueueOutcome {
    pub fn entry(&self) -> &QueueEntry {
        match self {
            Self::Created(entry) | Self::AlreadyQueued(entry) => entry,
        }
    }

    pub fn into_entry(self) -> QueueEntry {
        match self {
            Self::Created(entry) | Self::AlreadyQueued(entry) => entry,
        }
    }

    pub fn position(&self) -> i64 {
        self.entry().position
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Queue engine over the clinic database
#[derive(Clone)]
pub struct QueueEngine {
    db: ClinicDatabase,
    ledger: QueueLedger,
    clock: Arc<dyn Clock>,
}

impl QueueEngine {
    pub fn new(db: ClinicDatabase, clock: Arc<dyn Clock>) -> Self {
        let ledger = QueueLedger::new(db.pool().clone());
        Self { db, ledger, clock }
    }

    pub fn database(&self) -> &ClinicDatabase {
        &self.db
    }

    pub fn ledger(&self) -> &QueueLedger {
        &self.ledger
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The clinic's current local calendar date
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn key(&self, doctor_id: i64, date: Option<NaiveDate>) -> PartitionKey {
        PartitionKey::new(doctor_id, date.unwrap_or_else(|| self.today()))
    }

    /// Put the patient at the end of the doctor's line for `date` (today if
    /// omitted). A patient already in that line keeps their entry.
    ///
    /// Callers are trusted to pass an existing patient and doctor; see
    /// [`enqueue`](Self::enqueue) for the checked variant.
    pub async fn enqueue_append(
        &self,
        patient_id: i64,
        doctor_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<EnqueueOutcome> {
        let key = self.key(doctor_id, date);

        if let Some(existing) = self.ledger.find(patient_id, key).await? {
            debug!(
                "Patient {} already at position {} for doctor {} on {}",
                patient_id, existing.position, doctor_id, key.queue_date
            );
            return Ok(EnqueueOutcome::AlreadyQueued(existing));
        }

        // Max lookup and insert are one statement, so two concurrent appends
        // serialize on the write lock and see each other's rows.
        let inserted = sqlx::query_as::<_, QueueEntry>(&format!(
            "INSERT INTO queue_entries (patient_id, doctor_id, position, queue_date, created_at)
             SELECT ?1, ?2, COALESCE(MAX(position), 0) + 1, ?3, ?4
             FROM queue_entries
             WHERE doctor_id = ?2 AND queue_date = ?3
             ON CONFLICT(patient_id, doctor_id, queue_date) DO NOTHING
             RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(patient_id)
        .bind(doctor_id)
        .bind(key.queue_date)
        .bind(self.clock.now())
        .fetch_optional(self.db.pool())
        .await?;

        match inserted {
            Some(entry) => {
                info!(
                    "Queued patient {} for doctor {} on {} at position {}",
                    patient_id, doctor_id, key.queue_date, entry.position
                );
                Ok(EnqueueOutcome::Created(entry))
            }
            // Lost a race against an identical append
            None => self
                .ledger
                .find(patient_id, key)
                .await?
                .map(EnqueueOutcome::AlreadyQueued)
                .ok_or(Error::AlreadyQueued {
                    patient_id,
                    doctor_id,
                    date: key.queue_date,
                }),
        }
    }

    /// Put the patient at position 1 of the doctor's line for `date` (today
    /// if omitted), moving everyone else back by one.
    ///
    /// A patient already in that line keeps their entry and nobody moves.
    pub async fn enqueue_front(
        &self,
        patient_id: i64,
        doctor_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<EnqueueOutcome> {
        let key = self.key(doctor_id, date);
        let mut tx = self.db.pool().begin().await?;

        // First statement writes, so the transaction holds the write lock
        // before it reads anything. The NOT EXISTS guard leaves the
        // partition untouched if the patient is already in it.
        sqlx::query(
            "UPDATE queue_entries SET position = -(position + 1)
             WHERE doctor_id = ?1 AND queue_date = ?2
               AND NOT EXISTS (
                   SELECT 1 FROM queue_entries
                   WHERE patient_id = ?3 AND doctor_id = ?1 AND queue_date = ?2
               )",
        )
        .bind(doctor_id)
        .bind(key.queue_date)
        .bind(patient_id)
        .execute(&mut *tx)
        .await?;

        let existing = sqlx::query_as::<_, QueueEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM queue_entries
             WHERE patient_id = ?1 AND doctor_id = ?2 AND queue_date = ?3"
        ))
        .bind(patient_id)
        .bind(doctor_id)
        .bind(key.queue_date)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing) = existing {
            tx.rollback().await?;
            debug!(
                "Patient {} already at position {} for doctor {} on {}, not moved",
                patient_id, existing.position, doctor_id, key.queue_date
            );
            return Ok(EnqueueOutcome::AlreadyQueued(existing));
        }

        sqlx::query(
            "UPDATE queue_entries SET position = -position
             WHERE doctor_id = ?1 AND queue_date = ?2 AND position < 0",
        )
        .bind(doctor_id)
        .bind(key.queue_date)
        .execute(&mut *tx)
        .await?;

        let entry = sqlx::query_as::<_, QueueEntry>(&format!(
            "INSERT INTO queue_entries (patient_id, doctor_id, position, queue_date, created_at)
             VALUES (?1, ?2, 1, ?3, ?4)
             RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(patient_id)
        .bind(doctor_id)
        .bind(key.queue_date)
        .bind(self.clock.now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Queued patient {} at the front for doctor {} on {}",
            patient_id, doctor_id, key.queue_date
        );
        Ok(EnqueueOutcome::Created(entry))
    }

    /// Checked append: both the patient and the doctor must exist
    pub async fn enqueue(
        &self,
        patient_id: i64,
        doctor_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<EnqueueOutcome> {
        self.db.require_patient(patient_id).await?;
        self.db.get_doctor(doctor_id).await?;
        self.enqueue_append(patient_id, doctor_id, date).await
    }

    /// Delete one entry and close the gap it leaves
    pub async fn remove_entry(&self, entry_id: i64) -> Result<QueueEntry> {
        let mut tx = self.db.pool().begin().await?;

        let removed = sqlx::query_as::<_, QueueEntry>(&format!(
            "DELETE FROM queue_entries WHERE id = ?1 RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(entry_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::QueueEntryNotFound(entry_id))?;

        sqlx::query(
            "UPDATE queue_entries SET position = -(position - 1)
             WHERE doctor_id = ?1 AND queue_date = ?2 AND position > ?3",
        )
        .bind(removed.doctor_id)
        .bind(removed.queue_date)
        .bind(removed.position)
        .execute(&mut *tx)
        .await?;

        let shifted = sqlx::query(
            "UPDATE queue_entries SET position = -position
             WHERE doctor_id = ?1 AND queue_date = ?2 AND position < 0",
        )
        .bind(removed.doctor_id)
        .bind(removed.queue_date)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        info!(
            "Removed queue entry {} (patient {}, position {}) for doctor {} on {}; {} moved up",
            removed.id,
            removed.patient_id,
            removed.position,
            removed.doctor_id,
            removed.queue_date,
            shifted
        );
        Ok(removed)
    }

    /// The doctor's line for `date` (today if omitted), in order
    pub async fn partition(&self, doctor_id: i64, date: Option<NaiveDate>) -> Result<QueuePartition> {
        self.ledger.partition(self.key(doctor_id, date)).await
    }

    /// The patient's place in the doctor's line for `date` (today if
    /// omitted), along with the date that was looked up
    pub async fn position_of(
        &self,
        patient_id: i64,
        doctor_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<(NaiveDate, Option<i64>)> {
        let key = self.key(doctor_id, date);
        let position = self.ledger.position_of(patient_id, key).await?;
        Ok((key.queue_date, position))
    }

    /// Empty one partition. Admins and doctors only.
    pub async fn clear_partition(
        &self,
        caller: &Caller,
        doctor_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<u64> {
        caller.require_any(&[Role::Admin, Role::Doctor], "clear a queue")?;
        let key = self.key(doctor_id, date);

        let removed = sqlx::query("DELETE FROM queue_entries WHERE doctor_id = ?1 AND queue_date = ?2")
            .bind(key.doctor_id)
            .bind(key.queue_date)
            .execute(self.db.pool())
            .await?
            .rows_affected();

        info!(
            "User {} ({}) cleared queue of doctor {} on {}: {} entries removed",
            caller.user_id, caller.role, doctor_id, key.queue_date, removed
        );
        Ok(removed)
    }

    /// Drop every entry dated before today, across all doctors. Admins only.
    pub async fn expire_old(&self, caller: &Caller) -> Result<u64> {
        if let Err(e) = caller.require_any(&[Role::Admin], "reset all queues") {
            warn!("User {} denied queue reset: {}", caller.user_id, e);
            return Err(e);
        }
        self.expire_stale().await
    }

    /// Drop every entry dated before today. Used by the daily reset task.
    pub async fn expire_stale(&self) -> Result<u64> {
        let today = self.today();

        let removed = sqlx::query("DELETE FROM queue_entries WHERE queue_date < ?1")
            .bind(today)
            .execute(self.db.pool())
            .await?
            .rows_affected();

        if removed > 0 {
            info!("Expired {} queue entries dated before {}", removed, today);
        } else {
            debug!("No queue entries dated before {}", today);
        }
        Ok(removed)
    }
}
