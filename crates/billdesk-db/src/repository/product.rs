//! # Product Repository
//!
//! CRUD for the product catalogue. Bill items copy the product's id and name,
//! so deleting a product never touches stored bills.

use billdesk_core::{NewProduct, Product};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, name, category, unit, selling_price, cost_price, stock, \
    min_stock, barcode, description, created_at, created_by, updated_at, updated_by";

/// Repository for products.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products, newest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products: Vec<Product> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    /// Inserts a product and returns its generated ID.
    pub async fn insert(&self, product: &NewProduct, created_by: Option<&str>) -> DbResult<String> {
        let id = Uuid::new_v4().simple().to_string();

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, unit, selling_price, cost_price,
                stock, min_stock, barcode, description, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.unit)
        .bind(product.selling_price)
        .bind(product.cost_price)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(&product.barcode)
        .bind(&product.description)
        .bind(created_by)
        .execute(&self.pool)
        .await?;

        info!(id = %id, name = %product.name, "Product added");
        Ok(id)
    }

    /// Overwrites a product's fields.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No product has this ID
    pub async fn update(
        &self,
        id: &str,
        product: &NewProduct,
        updated_by: Option<&str>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                unit = ?4,
                selling_price = ?5,
                cost_price = ?6,
                stock = ?7,
                min_stock = ?8,
                barcode = ?9,
                description = ?10,
                updated_by = ?11,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.unit)
        .bind(product.selling_price)
        .bind(product.cost_price)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(&product.barcode)
        .bind(&product.description)
        .bind(updated_by)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product updated");
        Ok(())
    }

    /// Deletes a product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No product has this ID
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Counts products at or below their reorder level.
    pub async fn count_low_stock(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock <= min_stock")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{item, sample_bill, test_db};
    use billdesk_core::Money;

    fn rice() -> NewProduct {
        NewProduct {
            name: "Rice".to_string(),
            category: "Grocery".to_string(),
            unit: "kg".to_string(),
            selling_price: Money::from_cents(12000),
            cost_price: Money::from_cents(10000),
            stock: 50,
            min_stock: 5,
            barcode: Some("8901234567890".to_string()),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_insert_generates_hex_id() {
        let db = test_db().await;
        let id = db.products().insert(&rice(), Some("Asha")).await.unwrap();

        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

        let stored = db.products().get(&id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Rice");
        assert_eq!(stored.selling_price.cents(), 12000);
        assert_eq!(stored.created_by.as_deref(), Some("Asha"));
        assert!(stored.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_update_and_missing() {
        let db = test_db().await;
        let repo = db.products();
        let id = repo.insert(&rice(), None).await.unwrap();

        let mut changed = rice();
        changed.stock = 3;
        repo.update(&id, &changed, Some("Ram")).await.unwrap();

        let stored = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 3);
        assert_eq!(stored.updated_by.as_deref(), Some("Ram"));
        assert!(stored.updated_at.is_some());
        assert!(stored.is_low_stock());
        assert_eq!(repo.count_low_stock().await.unwrap(), 1);

        let err = repo.update("nope", &changed, None).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_negative_price_rejected_by_schema() {
        let db = test_db().await;
        let mut bad = rice();
        bad.cost_price = Money::from_cents(-1);

        let err = db.products().insert(&bad, None).await.unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_keeps_bill_items() {
        let db = test_db().await;
        let id = db.products().insert(&rice(), None).await.unwrap();
        let created = db
            .bills()
            .create(&sample_bill(vec![item(&id, "Rice", 1, 12000)]))
            .await
            .unwrap();

        db.products().delete(&id).await.unwrap();
        assert!(db.products().list().await.unwrap().is_empty());

        let bill = db.bills().get(created.bill_id).await.unwrap().unwrap();
        assert_eq!(bill.items.len(), 1);
        assert_eq!(bill.items[0].product_id.as_deref(), Some(id.as_str()));

        let err = db.products().delete(&id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
