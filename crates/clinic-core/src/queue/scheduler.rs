//! Daily queue reset
//!
//! Background task that wakes at the configured local time each day and
//! expires every queue entry dated before the new day.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDateTime, NaiveTime};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::engine::QueueEngine;
use crate::Result;

/// Next occurrence of `at` strictly after `now`
pub fn next_reset_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        // checked_add_days only fails at the end of the calendar
        now.date()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(at))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

/// Handle to the running reset task
pub struct DailyResetScheduler {
    handle: JoinHandle<()>,
}

impl DailyResetScheduler {
    /// Start the reset loop on the current tokio runtime
    pub fn spawn(engine: Arc<QueueEngine>, reset_time: NaiveTime) -> Self {
        info!("🕛 Daily queue reset scheduled at {}", reset_time.format("%H:%M"));

        let handle = tokio::spawn(async move {
            loop {
                let now = engine.clock().local_now();
                let next = next_reset_after(now, reset_time);
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

                tokio::time::sleep(wait).await;

                if let Err(e) = Self::run_once(&engine).await {
                    error!("Daily queue reset failed: {}", e);
                }
            }
        });

        Self { handle }
    }

    /// One reset pass
    pub async fn run_once(engine: &QueueEngine) -> Result<u64> {
        let removed = engine.expire_stale().await?;
        info!("🧹 Daily queue reset for {}: {} stale entries removed", engine.today(), removed);
        Ok(removed)
    }

    /// Stop the loop. A reset pass in flight is dropped with its transaction.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for DailyResetScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
