//! Per-doctor daily visit queues
//!
//! - [`ledger`]: read model of a (doctor, date) partition
//! - [`engine`]: append, front insert, removal, clearing and expiry
//! - [`scheduler`]: daily reset task

pub mod engine;
pub mod ledger;
pub mod scheduler;

pub use engine::{EnqueueOutcome, QueueEngine};
pub use ledger::{PartitionKey, QueueEntry, QueueEntryWithPatient, QueueLedger, QueuePartition};
pub use scheduler::{next_reset_after, DailyResetScheduler};
