//! # Report Repository
//!
//! Aggregates for the dashboard summary. Cancelled bills are counted but do
//! not contribute to sales totals.

use billdesk_core::period::DateRange;
use billdesk_core::{BillStatus, Money};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Bill count and value for one status.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StatusTotal {
    pub status: BillStatus,
    pub count: i64,
    pub total: Money,
}

/// Expense total for one category.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
}

/// Dashboard summary over an optional date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,

    /// Net amount of paid and pending bills.
    pub total_sales: Money,
    pub total_expenses: Money,

    /// `total_sales - total_expenses`; may be negative.
    pub net_profit: Money,

    pub bill_count: i64,
    pub paid_bills: i64,
    pub pending_bills: i64,
    pub cancelled_bills: i64,

    /// Products at or below their reorder level (range independent).
    pub low_stock_products: i64,

    pub sales_by_status: Vec<StatusTotal>,
    pub expenses_by_category: Vec<CategoryTotal>,
}

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Builds the summary for `range` (all time when `None`).
    pub async fn summary(&self, range: Option<DateRange>) -> DbResult<SummaryReport> {
        let from = range.map(|r| r.from);
        let to = range.map(|r| r.to);

        let sales_by_status: Vec<StatusTotal> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(net_amount), 0) AS total
            FROM bills
            WHERE (?1 IS NULL OR date(date_time) >= ?1)
              AND (?2 IS NULL OR date(date_time) <= ?2)
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let expenses_by_category: Vec<CategoryTotal> = sqlx::query_as(
            r#"
            SELECT category, COALESCE(SUM(amount), 0) AS total
            FROM expenses
            WHERE (?1 IS NULL OR date >= ?1)
              AND (?2 IS NULL OR date <= ?2)
            GROUP BY category
            ORDER BY total DESC, category
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let low_stock_products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock <= min_stock")
                .fetch_one(&self.pool)
                .await?;

        let count_of = |status: BillStatus| {
            sales_by_status
                .iter()
                .find(|s| s.status == status)
                .map_or(0, |s| s.count)
        };

        let total_sales: Money = sales_by_status
            .iter()
            .filter(|s| s.status != BillStatus::Cancelled)
            .map(|s| s.total)
            .sum();
        let total_expenses: Money = expenses_by_category.iter().map(|c| c.total).sum();

        let report = SummaryReport {
            from,
            to,
            total_sales,
            total_expenses,
            net_profit: total_sales - total_expenses,
            bill_count: sales_by_status.iter().map(|s| s.count).sum(),
            paid_bills: count_of(BillStatus::Paid),
            pending_bills: count_of(BillStatus::Pending),
            cancelled_bills: count_of(BillStatus::Cancelled),
            low_stock_products,
            sales_by_status,
            expenses_by_category,
        };

        debug!(
            bills = report.bill_count,
            total_sales = %report.total_sales,
            "Built summary report"
        );
        Ok(report)
    }
}
