//! # Bill Repository
//!
//! Keeps a bill, its items and the derived sales rows consistent as a unit.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(bill)                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bill_lock.lock()             ← one bill writer per process            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE              ← one writer per database file           │
//! │   ├── bill_number supplied and free?  ── yes ──► keep it               │
//! │   │                                   └─ no ───► allocate (scan)       │
//! │   ├── INSERT bills                                                     │
//! │   ├── for each item:                                                   │
//! │   │    ├── INSERT bill_items                                           │
//! │   │    ├── SELECT category FROM products (missing ⇒ NULL)              │
//! │   │    └── INSERT sales                                                │
//! │   └── COMMIT  (any error before this ⇒ ROLLBACK, nothing visible)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The write lock is taken before the first read, so the number scan sees
//! every committed bill and no other connection, in this process or another,
//! can insert between the scan and the INSERT. A writer that finds the file
//! locked waits up to the configured busy timeout.

use billdesk_core::bill_number::next_bill_number;
use billdesk_core::{Bill, BillItem, BillStatus, BillWithItems, NewBill};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::settings::load_bill_number_format;

const BILL_COLUMNS: &str = "bill_id, bill_number, customer_name, customer_phone, \
    customer_address, subtotal, discount, discount_type, vat_rate, vat_amount, \
    net_amount, date_time, status, payment_method, notes, cashier_id, created_at";

const ITEM_COLUMNS: &str = "id, bill_id, product_id, product_name, quantity, price, total_price";

// =============================================================================
// Types
// =============================================================================

/// Filters for [`BillRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub status: Option<BillStatus>,

    /// Substring of customer name or bill number.
    pub search: Option<String>,
}

/// Storage key and resolved bill number of a newly created bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedBill {
    pub bill_id: i64,
    pub bill_number: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for bills and their items.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.bills();
///
/// let created = repo.create(&new_bill).await?;
/// let bill = repo.get(created.bill_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
    bill_lock: Arc<Mutex<()>>,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool, bill_lock: Arc<Mutex<()>>) -> Self {
        BillRepository { pool, bill_lock }
    }

    /// Lists bills, newest `date_time` first, each with its items.
    pub async fn list(&self, filter: &BillFilter) -> DbResult<Vec<BillWithItems>> {
        debug!(status = ?filter.status, search = ?filter.search, "Listing bills");

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE 1 = 1"
        ));

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            query
                .push(" AND (customer_name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR bill_number LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        query.push(" ORDER BY date_time DESC, bill_id DESC");

        let bills: Vec<Bill> = query.build_query_as().fetch_all(&self.pool).await?;
        let mut items = self.items_for(&bills).await?;

        let result = bills
            .into_iter()
            .map(|bill| {
                let items = items.remove(&bill.bill_id).unwrap_or_default();
                BillWithItems { bill, items }
            })
            .collect::<Vec<_>>();

        debug!(count = result.len(), "Listed bills");
        Ok(result)
    }

    /// Gets a bill with its items.
    ///
    /// ## Returns
    /// * `Ok(Some(..))` - Bill found
    /// * `Ok(None)` - No bill has this `bill_id`
    pub async fn get(&self, bill_id: i64) -> DbResult<Option<BillWithItems>> {
        let bill: Option<Bill> =
            sqlx::query_as(&format!("SELECT {BILL_COLUMNS} FROM bills WHERE bill_id = ?1"))
                .bind(bill_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(bill) = bill else {
            return Ok(None);
        };

        let items: Vec<BillItem> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM bill_items WHERE bill_id = ?1 ORDER BY id"
        ))
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(BillWithItems { bill, items }))
    }

    /// Creates a bill with its items and sales rows.
    ///
    /// A missing bill number, or one already in use, is replaced by a freshly
    /// allocated one.
    ///
    /// ## Returns
    /// * `Ok(CreatedBill)` - storage key and the bill number actually used
    /// * `Err(DbError::ConstraintViolation)` - an item failed a CHECK; no rows written
    pub async fn create(&self, bill: &NewBill) -> DbResult<CreatedBill> {
        let _guard = self.bill_lock.lock().await;
        let mut tx = self.begin_write().await?;

        let requested = bill
            .bill_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let bill_number = match requested {
            Some(number) if !bill_number_exists(&mut tx, number).await? => number.to_string(),
            _ => allocate_bill_number(&mut tx).await?,
        };

        let bill_id = sqlx::query(
            r#"
            INSERT INTO bills (
                bill_number, customer_name, customer_phone, customer_address,
                subtotal, discount, discount_type, vat_rate, vat_amount, net_amount,
                date_time, status, payment_method, notes, cashier_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&bill_number)
        .bind(&bill.customer_name)
        .bind(&bill.customer_phone)
        .bind(&bill.customer_address)
        .bind(bill.subtotal)
        .bind(bill.discount)
        .bind(bill.discount_type)
        .bind(bill.vat_rate)
        .bind(bill.vat_amount)
        .bind(bill.net_amount)
        .bind(bill.date_time)
        .bind(bill.status)
        .bind(&bill.payment_method)
        .bind(&bill.notes)
        .bind(&bill.cashier_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        insert_items_and_sales(&mut tx, bill_id, &bill_number, bill).await?;

        tx.commit().await?;

        info!(
            bill_id,
            bill_number = %bill_number,
            items = bill.items.len(),
            "Bill created"
        );
        Ok(CreatedBill {
            bill_id,
            bill_number,
        })
    }

    /// Opens a transaction that holds the database write lock from its
    /// first statement.
    ///
    /// A deferred transaction that reads first cannot be upgraded once
    /// another connection commits (SQLITE_BUSY_SNAPSHOT in WAL mode), and
    /// that error bypasses the busy timeout.
    async fn begin_write(&self) -> DbResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Replaces a bill's header, items and sales rows.
    ///
    /// Items and sales are deleted and regenerated from `bill.items`; nothing
    /// is merged. The bill number is kept when `bill.bill_number` is `None`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No bill has this `bill_id`
    pub async fn update(&self, bill_id: i64, bill: &NewBill) -> DbResult<()> {
        debug!(bill_id, "Updating bill");

        let _guard = self.bill_lock.lock().await;
        let mut tx = self.begin_write().await?;

        let current = current_bill_number(&mut tx, bill_id).await?;
        let bill_number = bill
            .bill_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&current)
            .to_string();

        sqlx::query("DELETE FROM sales WHERE invoice_number = ?1")
            .bind(&current)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE bills SET
                bill_number = ?2,
                customer_name = ?3,
                customer_phone = ?4,
                customer_address = ?5,
                subtotal = ?6,
                discount = ?7,
                discount_type = ?8,
                vat_rate = ?9,
                vat_amount = ?10,
                net_amount = ?11,
                date_time = ?12,
                status = ?13,
                payment_method = ?14,
                notes = ?15,
                cashier_id = ?16
            WHERE bill_id = ?1
            "#,
        )
        .bind(bill_id)
        .bind(&bill_number)
        .bind(&bill.customer_name)
        .bind(&bill.customer_phone)
        .bind(&bill.customer_address)
        .bind(bill.subtotal)
        .bind(bill.discount)
        .bind(bill.discount_type)
        .bind(bill.vat_rate)
        .bind(bill.vat_amount)
        .bind(bill.net_amount)
        .bind(bill.date_time)
        .bind(bill.status)
        .bind(&bill.payment_method)
        .bind(&bill.notes)
        .bind(&bill.cashier_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM bill_items WHERE bill_id = ?1")
            .bind(bill_id)
            .execute(&mut *tx)
            .await?;

        insert_items_and_sales(&mut tx, bill_id, &bill_number, bill).await?;

        tx.commit().await?;

        info!(bill_id, bill_number = %bill_number, items = bill.items.len(), "Bill updated");
        Ok(())
    }

    /// Deletes a bill, its sales rows and (by cascade) its items.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No bill has this `bill_id`
    pub async fn delete(&self, bill_id: i64) -> DbResult<()> {
        let _guard = self.bill_lock.lock().await;
        let mut tx = self.begin_write().await?;

        let bill_number = current_bill_number(&mut tx, bill_id).await?;

        sqlx::query("DELETE FROM sales WHERE invoice_number = ?1")
            .bind(&bill_number)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM bills WHERE bill_id = ?1")
            .bind(bill_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(bill_id, bill_number = %bill_number, "Bill deleted");
        Ok(())
    }

    /// Previews the bill number the next create would allocate.
    ///
    /// Not a reservation: a concurrent create may take it first.
    pub async fn next_bill_number(&self) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        allocate_bill_number(&mut conn).await
    }

    /// Counts bills (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn items_for(&self, bills: &[Bill]) -> DbResult<HashMap<i64, Vec<BillItem>>> {
        let mut grouped: HashMap<i64, Vec<BillItem>> = HashMap::new();
        if bills.is_empty() {
            return Ok(grouped);
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {ITEM_COLUMNS} FROM bill_items WHERE bill_id IN ("
        ));
        let mut ids = query.separated(", ");
        for bill in bills {
            ids.push_bind(bill.bill_id);
        }
        ids.push_unseparated(") ORDER BY bill_id, id");

        let items: Vec<BillItem> = query.build_query_as().fetch_all(&self.pool).await?;
        for item in items {
            grouped.entry(item.bill_id).or_default().push(item);
        }
        Ok(grouped)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Computes the next free bill number using the store's configured format.
async fn allocate_bill_number(conn: &mut SqliteConnection) -> DbResult<String> {
    let format = load_bill_number_format(conn).await?;

    // substr instead of LIKE: LIKE is case-insensitive in SQLite
    let existing: Vec<String> = sqlx::query_scalar(
        "SELECT bill_number FROM bills WHERE substr(bill_number, 1, length(?1)) = ?1",
    )
    .bind(format.scan_prefix())
    .fetch_all(&mut *conn)
    .await?;

    let next = next_bill_number(&existing, &format);
    debug!(scanned = existing.len(), next = %next, "Allocated bill number");
    Ok(next)
}

async fn bill_number_exists(conn: &mut SqliteConnection, bill_number: &str) -> DbResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT bill_id FROM bills WHERE bill_number = ?1")
        .bind(bill_number)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

async fn current_bill_number(conn: &mut SqliteConnection, bill_id: i64) -> DbResult<String> {
    sqlx::query_scalar("SELECT bill_number FROM bills WHERE bill_id = ?1")
        .bind(bill_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Bill", bill_id))
}

/// Inserts every item of `bill` and one sales row per item.
async fn insert_items_and_sales(
    conn: &mut SqliteConnection,
    bill_id: i64,
    bill_number: &str,
    bill: &NewBill,
) -> DbResult<()> {
    let date_sold = bill.date_time.date();

    for item in &bill.items {
        sqlx::query(
            r#"
            INSERT INTO bill_items (bill_id, product_id, product_name, quantity, price, total_price)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(bill_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.total_price)
        .execute(&mut *conn)
        .await?;

        let category: Option<String> = match &item.product_id {
            Some(product_id) => {
                sqlx::query_scalar("SELECT category FROM products WHERE id = ?1")
                    .bind(product_id)
                    .fetch_optional(&mut *conn)
                    .await?
            }
            None => None,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (product_name, invoice_number, date_sold, amount, category, "user")
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.product_name)
        .bind(bill_number)
        .bind(date_sold)
        .bind(item.total_price)
        .bind(&category)
        .bind(&bill.cashier_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
