//! # Database Handle
//!
//! Opens the SQLite file, applies migrations and hands out repositories.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Database                                      │
//! │                                                                         │
//! │   SqlitePool (WAL)                       bill_lock: Mutex<()>           │
//! │   ┌──────┐ ┌──────┐ ┌──────┐             taken by bill create,          │
//! │   │ conn │ │ conn │ │ conn │ ...         update and delete              │
//! │   └──────┘ └──────┘ └──────┘                                            │
//! │                                                                         │
//! │   GET  /bills  ─────────────────────────► any connection                │
//! │   POST /bills  ──► bill_lock ──► BEGIN IMMEDIATE                        │
//! │                      allocate number, insert bill, items, sales         │
//! │                    COMMIT ──► release                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock orders bill writers inside this process; `BEGIN IMMEDIATE`
//! orders them against every other writer of the file, including other
//! processes. Waiting writers give up after `busy_timeout`.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::bill::BillRepository;
use crate::repository::expense::ExpenseRepository;
use crate::repository::product::ProductRepository;
use crate::repository::report::ReportRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::user::UserRepository;

const MEMORY_PATH: &str = ":memory:";

/// Where the database lives and how many connections to keep.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// Default 5. Forced to 1 for in-memory databases, which are
    /// per-connection.
    pub max_connections: u32,

    /// How long a query waits on a locked database file.
    pub busy_timeout: Duration,

    /// How long a request waits for a free pooled connection.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// Targets the file at `path`; missing parent directories are created on
    /// connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// A private, throwaway database. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            busy_timeout: Duration::from_secs(1),
            acquire_timeout: Duration::from_secs(5),
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        // bill_items rows cascade with their bill
        options
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
    }
}

/// Shared handle to the billing database.
///
/// Clones share one pool and one bill lock, so the handle can sit in axum
/// state directly.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    bill_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Connects and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        if !config.is_in_memory() {
            if let Some(dir) = config.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|e| {
                    DbError::ConnectionFailed(format!("cannot create {}: {e}", dir.display()))
                })?;
            }
        }

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(config.acquire_timeout);
        let max_connections = if config.is_in_memory() {
            // the schema lives only as long as its one connection
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
            1
        } else {
            config.max_connections
        };

        let pool = pool_options
            .max_connections(max_connections)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections, "Pool ready");

        migrations::run_migrations(&pool).await?;

        Ok(Database {
            pool,
            bill_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Returns `(total, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// Raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn bills(&self) -> BillRepository {
        BillRepository::new(self.pool.clone(), self.bill_lock.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    pub fn expenses(&self) -> ExpenseRepository {
        ExpenseRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Waits for in-flight queries, then closes every connection.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let (total, applied) = db.migration_status().await.unwrap();
        assert!(total >= 1);
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_dir() {
        let dir = std::env::temp_dir().join(format!("billdesk-{}", uuid::Uuid::new_v4().simple()));
        let path = dir.join("nested").join("bills.db");

        let db = Database::new(DbConfig::new(&path).max_connections(2)).await.unwrap();
        assert!(db.health_check().await);
        assert!(path.exists());

        db.close().await;
        assert!(!db.health_check().await);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_config() {
        assert_eq!(DbConfig::new("x.db").max_connections(0).max_connections, 1);
        assert!(DbConfig::in_memory().is_in_memory());
        assert!(!DbConfig::new("data/x.db").is_in_memory());
    }
}
