//! # billdesk-db: Database Layer for Billdesk
//!
//! This crate provides database access for Billdesk.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billdesk Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /bills)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     billdesk-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BillRepo      │    │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │   _schema    │  │   │
//! │  │   │ Write lock    │    │ SaleRepo ...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ./data/billdesk.db                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billdesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/billdesk.db")).await?;
//!
//! let created = db.bills().create(new_bill).await?;
//! println!("{} -> {}", created.bill_id, created.bill_number);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::bill::{BillFilter, BillRepository, CreatedBill};
pub use repository::expense::ExpenseRepository;
pub use repository::product::ProductRepository;
pub use repository::report::{ReportRepository, SummaryReport};
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::settings::SettingsRepository;
pub use repository::user::UserRepository;
