//! SQLite persistence for clinic-core
//!
//! One pool is shared by every request handler and the daily reset task.
//! Write statements serialize on SQLite's write lock; connections wait up
//! to `busy_timeout_ms` for it rather than failing immediately.

pub mod schema;
pub mod staff;
pub mod patients;
pub mod appointments;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, error, info};

use crate::config::DatabaseConfig;
use crate::Result;

/// Clinic database handle
#[derive(Clone)]
pub struct ClinicDatabase {
    pool: SqlitePool,
}

impl ClinicDatabase {
    /// Open (creating if needed) the database described by `config` and
    /// bootstrap the schema.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Opening clinic database at {}", config.url);

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Convenience wrapper for a bare URL with default pool settings
    pub async fn open(url: &str) -> Result<Self> {
        Self::connect(&DatabaseConfig {
            url: url.to_string(),
            ..DatabaseConfig::default()
        })
        .await
    }

    /// In-memory database for testing. Pinned to a single connection, since
    /// every SQLite connection to `:memory:` sees its own database.
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and make sure the schema exists
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        schema::initialize(&pool).await?;
        debug!("Clinic database schema ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Execute a health check query
    pub async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                error!("Database health check failed: {}", e);
                false
            }
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
