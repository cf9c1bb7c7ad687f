//! # Repository Module
//!
//! Database repository implementations for Billdesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.bills().create(&new_bill)                                  │
//! │       ▼                                                                 │
//! │  BillRepository                                                        │
//! │  ├── list(&self, filter)                                               │
//! │  ├── get(&self, bill_id)                                               │
//! │  ├── create(&self, bill)      ┐                                        │
//! │  ├── update(&self, id, bill)  ├─ one transaction each, write lock held │
//! │  └── delete(&self, id)        ┘                                        │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BillRepository`](bill::BillRepository) - Bills, items and derived sales
//! - [`ProductRepository`](product::ProductRepository) - Product catalogue
//! - [`SaleRepository`](sale::SaleRepository) - Sales listing and manual entry
//! - [`ExpenseRepository`](expense::ExpenseRepository) - Expenses and categories
//! - [`UserRepository`](user::UserRepository) - Staff accounts
//! - [`SettingsRepository`](settings::SettingsRepository) - Store settings row
//! - [`ReportRepository`](report::ReportRepository) - Dashboard aggregates

pub mod bill;
pub mod expense;
pub mod product;
pub mod report;
pub mod sale;
pub mod settings;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support {
    use billdesk_core::{BillStatus, DiscountType, Money, NewBill, NewBillItem, TaxRate};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Two independent handles on one fresh database file, as two server
    /// processes would open it. Remove the returned directory when done.
    pub async fn shared_file_dbs() -> (Database, Database, PathBuf) {
        let dir = std::env::temp_dir().join(format!("billdesk-{}", uuid::Uuid::new_v4().simple()));
        let path = dir.join("bills.db");
        let first = Database::new(DbConfig::new(&path).max_connections(2)).await.unwrap();
        let second = Database::new(DbConfig::new(&path).max_connections(2)).await.unwrap();
        (first, second, dir)
    }

    pub fn item(product_id: &str, name: &str, quantity: i64, price_cents: i64) -> NewBillItem {
        NewBillItem {
            product_id: Some(product_id.to_string()),
            product_name: name.to_string(),
            quantity,
            price: Money::from_cents(price_cents),
            total_price: Money::from_cents(price_cents * quantity),
        }
    }

    /// subtotal 100, discount 10 (amount), VAT 13%, two items at 50.
    pub fn sample_bill(items: Vec<NewBillItem>) -> NewBill {
        NewBill {
            bill_number: None,
            customer_name: "Ram Bahadur".to_string(),
            customer_phone: Some("9800000000".to_string()),
            customer_address: None,
            subtotal: Money::from_cents(10000),
            discount: Money::from_cents(1000),
            discount_type: DiscountType::Amount,
            vat_rate: TaxRate::from_bps(1300),
            vat_amount: Money::from_cents(1170),
            net_amount: Money::from_cents(10170),
            date_time: NaiveDate::from_ymd_opt(2024, 5, 15)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap(),
            status: BillStatus::Paid,
            payment_method: Some("cash".to_string()),
            notes: None,
            cashier_id: Some("cashier-1".to_string()),
            items,
        }
    }

    pub async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }
}
