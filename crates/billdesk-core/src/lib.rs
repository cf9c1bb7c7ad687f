//! # billdesk-core: Pure Business Logic for Billdesk
//!
//! This crate holds the domain rules of the billing backend as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billdesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Frontend (React / Next.js)                      │   │
//! │  │     Bills ──► Products ──► Expenses ──► Sales ──► Reports       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ billdesk-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌─────────────┐ ┌──────────────┐   │   │
//! │  │   │  types   │ │  money   │ │ bill_number │ │  validation  │   │   │
//! │  │   │  Bill    │ │  Money   │ │  allocator  │ │   totals     │   │   │
//! │  │   │  Sale    │ │ TaxRate  │ │             │ │   period     │   │   │
//! │  │   └──────────┘ └──────────┘ └─────────────┘ └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                billdesk-db (Database Layer)                     │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Bill, BillItem, Sale, Product, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`bill_number`] - Bill number allocation
//! - [`totals`] - Server-side cross-check of client-submitted totals
//! - [`period`] - Reporting period date ranges
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use billdesk_core::bill_number::{next_bill_number, BillNumberFormat};
//!
//! let existing = ["B-1000", "B-1002"];
//! let next = next_bill_number(existing, &BillNumberFormat::default());
//! assert_eq!(next, "B-1001");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill_number;
pub mod error;
pub mod money;
pub mod period;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix used for bill numbers when the store has not configured one.
pub const DEFAULT_BILL_PREFIX: &str = "B-";

/// First bill number handed out when the store has not configured one.
pub const DEFAULT_BILL_START_NUMBER: i64 = 1000;

/// Largest configurable starting bill number.
pub const MAX_BILL_START_NUMBER: i64 = 999_999_999;

/// Maximum line items allowed on a single bill.
pub const MAX_BILL_ITEMS: usize = 200;

/// Maximum quantity of a single bill line.
///
/// Guards against typos such as 10000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;
