//! # Database Migrations
//!
//! Embedded SQL migrations for Billdesk.
//!
//! ## How Migrations Work
//! ```text
//! Server startup
//!      │
//!      ▼
//! Check _sqlx_migrations table (created if missing)
//!      │
//!      ▼
//! Compare embedded migrations vs applied
//!      │
//!      ├── 001_initial_schema.sql ✓ (already applied)
//!      └── 002_....sql            ⬜ (NEW - needs to run)
//!      │
//!      ▼
//! Run pending migrations in order, record each in _sqlx_migrations
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Each migration runs in its own transaction, in filename order.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
///
/// Used by the health endpoint.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    Ok((total, applied as usize))
}
