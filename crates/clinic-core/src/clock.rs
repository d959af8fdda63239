//! Clock abstraction so "today" can be pinned in tests

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, Utc};
use parking_lot::Mutex;

/// Source of the current time. Queue partitions are keyed by the local
/// calendar date, so `today()` is the clinic's local date.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Local wall-clock time
    fn local_now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.local_now().date()
    }
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Manually driven clock for tests. Local time is treated as UTC.
#[derive(Debug, Clone)]
pub struct FixedClock {
    current: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(at)),
        }
    }

    /// Clock pinned to midday of the given date
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_hms_opt(12, 0, 0).unwrap_or_default())
    }

    pub fn set(&self, at: NaiveDateTime) {
        *self.current.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        *self.current.lock() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.current.lock().and_utc()
    }

    fn local_now(&self) -> NaiveDateTime {
        *self.current.lock()
    }
}
