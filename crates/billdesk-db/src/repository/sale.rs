//! # Sale Repository
//!
//! Sales rows are written alongside bills (see [`super::bill`]) or entered
//! by hand. This repository covers listing and manual entry.

use billdesk_core::period::DateRange;
use billdesk_core::{NewSale, Sale};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;

const SALE_COLUMNS: &str =
    r#"id, product_name, invoice_number, date_sold, amount, category, "user", created_at"#;

/// Filters for [`SaleRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    /// Inclusive `date_sold` window; `None` for all time.
    pub range: Option<DateRange>,

    /// Substring of product name, category, user or invoice number.
    pub search: Option<String>,
}

/// Repository for sales rows.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists sales, most recent `date_sold` first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {SALE_COLUMNS} FROM sales WHERE 1 = 1"));

        if let Some(range) = &filter.range {
            query
                .push(" AND date_sold BETWEEN ")
                .push_bind(range.from)
                .push(" AND ")
                .push_bind(range.to);
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            query
                .push(" AND (product_name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR category LIKE ")
                .push_bind(pattern.clone())
                .push(r#" OR "user" LIKE "#)
                .push_bind(pattern.clone())
                .push(" OR invoice_number LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        query.push(" ORDER BY date_sold DESC, id DESC");

        let sales: Vec<Sale> = query.build_query_as().fetch_all(&self.pool).await?;
        debug!(count = sales.len(), range = ?filter.range, "Listed sales");
        Ok(sales)
    }

    /// Lists the sales rows of one bill, in insertion order.
    pub async fn list_by_invoice(&self, invoice_number: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE invoice_number = ?1 ORDER BY id"
        ))
        .bind(invoice_number)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// Records a manually entered sale.
    pub async fn insert(&self, sale: &NewSale) -> DbResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO sales (product_name, invoice_number, date_sold, amount, category, "user")
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.product_name)
        .bind(&sale.invoice_number)
        .bind(sale.date_sold)
        .bind(sale.amount)
        .bind(&sale.category)
        .bind(&sale.user)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(id, invoice_number = %sale.invoice_number, "Sale added");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use billdesk_core::Money;
    use chrono::NaiveDate;

    fn sale(name: &str, invoice: &str, day: u32, category: Option<&str>) -> NewSale {
        NewSale {
            product_name: name.to_string(),
            invoice_number: invoice.to_string(),
            date_sold: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            amount: Money::from_cents(2500),
            category: category.map(str::to_string),
            user: Some("Asha".to_string()),
        }
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let db = test_db().await;
        let repo = db.sales();
        repo.insert(&sale("Tea", "B-1000", 1, Some("Drinks"))).await.unwrap();
        repo.insert(&sale("Soap", "B-1001", 20, None)).await.unwrap();

        let sales = repo.list(&SaleFilter::default()).await.unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].product_name, "Soap");
        assert_eq!(sales[1].amount.cents(), 2500);
    }

    #[tokio::test]
    async fn test_range_and_search() {
        let db = test_db().await;
        let repo = db.sales();
        repo.insert(&sale("Tea", "B-1000", 1, Some("Drinks"))).await.unwrap();
        repo.insert(&sale("Soap", "B-1001", 20, None)).await.unwrap();
        repo.insert(&sale("Coffee", "B-1002", 21, Some("Drinks"))).await.unwrap();

        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        )
        .unwrap();

        let late = repo
            .list(&SaleFilter {
                range: Some(range),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(late.len(), 2);

        let drinks = repo
            .list(&SaleFilter {
                range: Some(range),
                search: Some("drink".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].product_name, "Coffee");

        let by_invoice = repo
            .list(&SaleFilter {
                range: None,
                search: Some("B-1001".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(by_invoice.len(), 1);
    }
}
