//! Queue ledger: the read model over `queue_entries`
//!
//! A ledger is not stored anywhere. Each (doctor, date) partition is the set
//! of rows sharing that key, materialized on demand and ordered by position.
//! After every committed engine operation a partition of N entries holds
//! exactly the positions 1..=N.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::Result;

pub(crate) const ENTRY_COLUMNS: &str = "id, patient_id, doctor_id, position, queue_date, created_at";

/// Key of one doctor's line on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub doctor_id: i64,
    pub queue_date: NaiveDate,
}

impl PartitionKey {
    pub fn new(doctor_id: i64, queue_date: NaiveDate) -> Self {
        Self {
            doctor_id,
            queue_date,
        }
    }
}

/// One patient's slot in a doctor's line for one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueueEntry {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    /// 1-based place in line
    pub position: i64,
    pub queue_date: NaiveDate,
    /// Audit only, never used for ordering
    pub created_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn partition(&self) -> PartitionKey {
        PartitionKey::new(self.doctor_id, self.queue_date)
    }
}

/// Queue entry joined with the patient's display data
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QueueEntryWithPatient {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: QueueEntry,
    pub patient_full_name: String,
    pub patient_phone: String,
}

/// A materialized partition, ordered by position
#[derive(Debug, Clone, Serialize)]
pub struct QueuePartition {
    #[serde(flatten)]
    pub key: PartitionKey,
    pub queue: Vec<QueueEntryWithPatient>,
    pub total_count: usize,
}

impl QueuePartition {
    pub fn positions(&self) -> Vec<i64> {
        self.queue.iter().map(|e| e.entry.position).collect()
    }

    pub fn patient_ids(&self) -> Vec<i64> {
        self.queue.iter().map(|e| e.entry.patient_id).collect()
    }
}

/// True if `positions` (in any order) is exactly 1..=len
pub fn is_contiguous(positions: &[i64]) -> bool {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(i, &p)| p == i as i64 + 1)
}

/// Read accessors over the queue table
#[derive(Clone)]
pub struct QueueLedger {
    pool: SqlitePool,
}

impl QueueLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The entry for (patient, doctor, date), if any
    pub async fn find(&self, patient_id: i64, key: PartitionKey) -> Result<Option<QueueEntry>> {
        let entry = sqlx::query_as::<_, QueueEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM queue_entries
             WHERE patient_id = ?1 AND doctor_id = ?2 AND queue_date = ?3"
        ))
        .bind(patient_id)
        .bind(key.doctor_id)
        .bind(key.queue_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn position_of(&self, patient_id: i64, key: PartitionKey) -> Result<Option<i64>> {
        Ok(self.find(patient_id, key).await?.map(|e| e.position))
    }

    /// All entries of the partition with patient display data, by position
    pub async fn partition(&self, key: PartitionKey) -> Result<QueuePartition> {
        let queue = sqlx::query_as::<_, QueueEntryWithPatient>(
            "SELECT q.id, q.patient_id, q.doctor_id, q.position, q.queue_date, q.created_at,
                    p.full_name AS patient_full_name, p.phone AS patient_phone
             FROM queue_entries q
             JOIN patients p ON p.id = q.patient_id
             WHERE q.doctor_id = ?1 AND q.queue_date = ?2
             ORDER BY q.position ASC",
        )
        .bind(key.doctor_id)
        .bind(key.queue_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(QueuePartition {
            key,
            total_count: queue.len(),
            queue,
        })
    }

    pub async fn len(&self, key: PartitionKey) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM queue_entries WHERE doctor_id = ?1 AND queue_date = ?2",
        )
        .bind(key.doctor_id)
        .bind(key.queue_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Number of entries dated strictly before `date`, across all doctors
    pub async fn count_before(&self, date: NaiveDate) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM queue_entries WHERE queue_date < ?1")
                .bind(date)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
