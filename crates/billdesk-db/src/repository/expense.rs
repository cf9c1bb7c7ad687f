//! # Expense Repository
//!
//! Expenses and the expense category list. An expense stores its category by
//! name, so categories can be renamed or removed without touching history.

use billdesk_core::{Expense, ExpenseCategory, NewExpense, NewExpenseCategory};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const EXPENSE_COLUMNS: &str = "id, description, category, amount, date, payment_method, vendor, \
    notes, is_recurring, recurring_frequency, created_by, created_at, updated_by, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, description, color, is_active";

/// Repository for expenses and expense categories.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Lists all expenses, most recent date first.
    pub async fn list(&self) -> DbResult<Vec<Expense>> {
        let expenses: Vec<Expense> = sqlx::query_as(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY date DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = expenses.len(), "Listed expenses");
        Ok(expenses)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(expense)
    }

    pub async fn insert(&self, expense: &NewExpense, created_by: Option<&str>) -> DbResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO expenses (
                description, category, amount, date, payment_method, vendor,
                notes, is_recurring, recurring_frequency, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&expense.description)
        .bind(&expense.category)
        .bind(expense.amount)
        .bind(expense.date)
        .bind(&expense.payment_method)
        .bind(&expense.vendor)
        .bind(&expense.notes)
        .bind(expense.is_recurring)
        .bind(expense.recurring_frequency)
        .bind(created_by)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(id, category = %expense.category, amount = %expense.amount, "Expense added");
        Ok(id)
    }

    /// ## Returns
    /// * `Err(DbError::NotFound)` - No expense has this ID
    pub async fn update(
        &self,
        id: i64,
        expense: &NewExpense,
        updated_by: Option<&str>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE expenses SET
                description = ?2,
                category = ?3,
                amount = ?4,
                date = ?5,
                payment_method = ?6,
                vendor = ?7,
                notes = ?8,
                is_recurring = ?9,
                recurring_frequency = ?10,
                updated_by = ?11,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&expense.description)
        .bind(&expense.category)
        .bind(expense.amount)
        .bind(expense.date)
        .bind(&expense.payment_method)
        .bind(&expense.vendor)
        .bind(&expense.notes)
        .bind(expense.is_recurring)
        .bind(expense.recurring_frequency)
        .bind(updated_by)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        info!(id, "Expense updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        info!(id, "Expense deleted");
        Ok(())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Active categories, by name.
    pub async fn list_active_categories(&self) -> DbResult<Vec<ExpenseCategory>> {
        let categories = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM expense_categories WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Every category, active or not, by name.
    pub async fn list_all_categories(&self) -> DbResult<Vec<ExpenseCategory>> {
        let categories = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM expense_categories ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Category names that appear on at least one expense.
    pub async fn distinct_categories(&self) -> DbResult<Vec<String>> {
        let names = sqlx::query_scalar(
            "SELECT DISTINCT category FROM expenses WHERE category <> '' ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Adds a category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - A category with this name exists,
    ///   compared case-insensitively
    pub async fn add_category(&self, category: &NewExpenseCategory) -> DbResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO expense_categories (name, description, color, is_active)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.color)
        .bind(category.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &category.name),
            other => other,
        })?
        .last_insert_rowid();

        info!(id, name = %category.name, "Expense category added");
        Ok(id)
    }

    pub async fn update_category(&self, id: i64, category: &NewExpenseCategory) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE expense_categories
            SET name = ?2, description = ?3, color = ?4, is_active = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.color)
        .bind(category.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &category.name),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense category", id));
        }

        info!(id, name = %category.name, "Expense category updated");
        Ok(())
    }

    pub async fn delete_category(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expense_categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense category", id));
        }

        info!(id, "Expense category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use billdesk_core::{Money, RecurringFrequency};
    use chrono::NaiveDate;

    fn rent() -> NewExpense {
        NewExpense {
            description: "Shop rent".to_string(),
            category: "Rent".to_string(),
            amount: Money::from_cents(2_500_000),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            payment_method: "bank".to_string(),
            vendor: Some("Landlord".to_string()),
            notes: None,
            is_recurring: true,
            recurring_frequency: Some(RecurringFrequency::Monthly),
        }
    }

    fn category(name: &str) -> NewExpenseCategory {
        NewExpenseCategory {
            name: name.to_string(),
            description: String::new(),
            color: "#6B7280".to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_expense_lifecycle() {
        let db = test_db().await;
        let repo = db.expenses();

        let id = repo.insert(&rent(), Some("Asha")).await.unwrap();
        let stored = repo.get(id).await.unwrap().unwrap();
        assert_eq!(stored.amount.cents(), 2_500_000);
        assert_eq!(stored.recurring_frequency, Some(RecurringFrequency::Monthly));
        assert_eq!(stored.created_by.as_deref(), Some("Asha"));

        let mut changed = rent();
        changed.amount = Money::from_cents(2_600_000);
        repo.update(id, &changed, Some("Ram")).await.unwrap();
        let stored = repo.get(id).await.unwrap().unwrap();
        assert_eq!(stored.amount.cents(), 2_600_000);
        assert_eq!(stored.updated_by.as_deref(), Some("Ram"));

        repo.delete(id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(repo.delete(id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_orders_by_date() {
        let db = test_db().await;
        let repo = db.expenses();

        let mut older = rent();
        older.date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        repo.insert(&older, None).await.unwrap();
        repo.insert(&rent(), None).await.unwrap();

        let expenses = repo.list().await.unwrap();
        assert_eq!(expenses[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(repo.distinct_categories().await.unwrap(), vec!["Rent".to_string()]);
    }

    #[tokio::test]
    async fn test_category_name_unique_ignoring_case() {
        let db = test_db().await;
        let repo = db.expenses();

        repo.add_category(&category("Utilities")).await.unwrap();
        let err = repo.add_category(&category("utilities")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_inactive_categories_hidden() {
        let db = test_db().await;
        let repo = db.expenses();

        let id = repo.add_category(&category("Travel")).await.unwrap();
        repo.add_category(&category("Rent")).await.unwrap();

        let mut inactive = category("Travel");
        inactive.is_active = false;
        repo.update_category(id, &inactive).await.unwrap();

        assert_eq!(repo.list_active_categories().await.unwrap().len(), 1);
        assert_eq!(repo.list_all_categories().await.unwrap().len(), 2);

        repo.delete_category(id).await.unwrap();
        assert!(matches!(
            repo.delete_category(id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
