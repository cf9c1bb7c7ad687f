//! # User Repository
//!
//! Staff accounts. Hashing happens in the caller; this layer only stores the
//! PHC string.

use billdesk_core::{NewUser, User, UserUpdate};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, employee_id, store_id, \
    phone, address, created_at, last_active, is_active";

/// Repository for users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Lists all users, oldest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Looks a user up by email, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Creates a user with the next employee ID.
    ///
    /// ## Returns
    /// * `Ok((id, employee_id))`
    /// * `Err(DbError::UniqueViolation)` - The email is registered
    pub async fn insert(&self, user: &NewUser) -> DbResult<(i64, String)> {
        let mut tx = self.pool.begin().await?;

        let last: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(CAST(employee_id AS INTEGER)), 0) FROM users",
        )
        .fetch_one(&mut *tx)
        .await?;
        let employee_id = format!("{:06}", last + 1);

        let id = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, employee_id, phone, address)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&employee_id)
        .bind(&user.phone)
        .bind(&user.address)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field == "users.email" => {
                DbError::duplicate(field, &user.email)
            }
            other => other,
        })?
        .last_insert_rowid();

        tx.commit().await?;

        info!(id, employee_id = %employee_id, role = %user.role, "User registered");
        Ok((id, employee_id))
    }

    /// ## Returns
    /// * `Err(DbError::NotFound)` - No user has this ID
    /// * `Err(DbError::UniqueViolation)` - The new email belongs to someone else
    pub async fn update(&self, id: i64, update: &UserUpdate) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?2, email = ?3, role = ?4, phone = ?5, address = ?6, is_active = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(update.role)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(update.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &update.email),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id, "User updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id, "User deleted");
        Ok(())
    }

    pub async fn set_password(&self, id: i64, password_hash: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?2 WHERE id = ?1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id, "Password changed");
        Ok(())
    }

    /// Records a successful login.
    pub async fn touch_last_active(&self, id: i64) -> DbResult<()> {
        sqlx::query("UPDATE users SET last_active = datetime('now') WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!(id, "Updated last_active");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
